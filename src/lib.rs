//! Monte Carlo tree search for N×N tic-tac-toe.
//!
//! This library picks moves for tic-tac-toe played on any square board, where a player wins by
//! filling a whole row, column or main diagonal. Moves are chosen with UCT-guided Monte Carlo
//! Tree Search over uniformly random rollouts.
//!
//! # Example
//!
//! ```rust
//! use tictactoe_mcts::board::{Coord, GameState, Player};
//! use tictactoe_mcts::config::SearchConfig;
//! use tictactoe_mcts::mcts::{MonteCarloTreeSearch, DEFAULT_NODE_CAPACITY};
//! use tictactoe_mcts::random::SeededRandomGenerator;
//!
//! // Player one can complete the top row
//! let board = GameState::from_flat(&[1, 1, 0, 2, 2, 0, 0, 0, 0], Player::One).unwrap();
//!
//! // Create and configure a new MCTS search instance using the builder
//! let mut mcts = MonteCarloTreeSearch::builder(board)
//!     .with_config(SearchConfig::with_iterations(1000))
//!     .with_random_generator(SeededRandomGenerator::new(42))
//!     .with_node_capacity(DEFAULT_NODE_CAPACITY)
//!     .build()
//!     .unwrap();
//!
//! // Search until the budget runs out
//! let report = mcts.run().unwrap();
//!
//! assert_eq!(report.best_move, Coord::new(0, 2));
//! println!("The best move is: {}", report.best_move);
//! ```

/// Game state, players, coordinates and outcomes.
pub mod board;
/// Search budgets and parameters.
pub mod config;
/// Error type shared by the whole crate.
pub mod error;
/// The core module of the library, containing the `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// Contains the `MctsNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// Contains traits and implementations for random number generation.
pub mod random;

pub use board::{Coord, GameOutcome, GameState, Player};
pub use config::SearchConfig;
pub use error::{MctsError, Result};
pub use mcts::{choose_move, decide, Decision, MonteCarloTreeSearch, SearchReport};
