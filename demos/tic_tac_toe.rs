use tictactoe_mcts::board::GameState;
use tictactoe_mcts::config::SearchConfig;
use tictactoe_mcts::error::{MctsError, Result};
use tictactoe_mcts::mcts::choose_move;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Let the engine play both sides of a game
    let mut board = GameState::default();
    let config = SearchConfig::with_iterations(5000).seed(2024);

    loop {
        println!("{board}");
        let report = match choose_move(&board, &config) {
            Ok(report) => report,
            Err(MctsError::NoLegalMoves(outcome)) => {
                println!("Game over: {outcome:?}");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        // Print the chances
        for stats in &report.moves {
            println!(
                "Move: {} = {:.2?}% ({} visits)",
                stats.coord,
                stats.wins_rate() * 100.0,
                stats.visits
            );
        }
        println!("{:?} plays {}\n", board.to_move(), report.best_move);

        board = board.play(report.best_move)?;
    }
}
