use crate::board::{Coord, GameOutcome, GameState, Player};

/// Represents a single node in the Monte Carlo search tree.
///
/// Each node stores the position reached by the move that created it, together with the
/// statistics of every rollout that passed through it. Parent and child links live in the
/// enclosing `ego_tree::Tree`; the parent link is only used to walk back towards the root.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// The depth of the node below the root.
    pub height: u32,
    /// The position this node represents.
    pub board: GameState,
    /// The move that led to this node's position from its parent. `None` for the root node.
    pub prev_move: Option<Coord>,
    /// The player who moved into this node. For the root, the opponent of the player to move.
    pub mover: Player,
    /// Cached outcome of `board`.
    pub outcome: GameOutcome,
    /// The number of rollouts that passed through or ended at this node.
    pub visits: u32,
    /// Credit earned by `mover`: 1 per win, 0.5 per draw. Always within `0..=visits`.
    pub wins: f64,
}

impl MctsNode {
    /// Creates the root node for `board`.
    pub fn root(board: GameState) -> Self {
        let mover = board.to_move().opponent();
        Self::new(board, None, mover, 0)
    }

    /// Creates an unvisited node.
    pub fn new(board: GameState, prev_move: Option<Coord>, mover: Player, height: u32) -> Self {
        let outcome = board.outcome();
        MctsNode {
            height,
            board,
            prev_move,
            mover,
            outcome,
            visits: 0,
            wins: 0.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_over()
    }

    /// Calculates the win rate of this node.
    pub fn wins_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / f64::from(self.visits)
        }
    }

    /// Upper Confidence Bound for Trees. Unvisited nodes score `+∞`.
    pub fn uct_value(&self, parent_visits: u32, exploration_constant: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }

        let visits = f64::from(self.visits);
        self.wins / visits
            + exploration_constant * f64::sqrt(f64::ln(f64::from(parent_visits)) / visits)
    }

    /// Records one rollout result, crediting `mover` for a win and half a point for a draw.
    pub fn record(&mut self, result: GameOutcome) {
        self.visits += 1;
        match result {
            GameOutcome::Win(winner) if winner == self.mover => self.wins += 1.0,
            GameOutcome::Draw => self.wins += 0.5,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_mover_is_previous_player() {
        let root = MctsNode::root(GameState::default());
        assert_eq!(root.mover, Player::Two);
        assert_eq!(root.prev_move, None);
        assert_eq!(root.height, 0);
        assert_eq!(root.outcome, GameOutcome::InProgress);
    }

    #[test]
    fn unvisited_node_is_explored_first() {
        let node = MctsNode::root(GameState::default());
        assert_eq!(node.uct_value(10, 1.0), f64::INFINITY);
        assert_eq!(node.wins_rate(), 0.0);
    }

    #[test]
    fn uct_combines_win_rate_and_exploration() {
        let mut node = MctsNode::root(GameState::default());
        node.visits = 4;
        node.wins = 3.0;

        let expected = 0.75 + 2.0 * (f64::ln(16.0) / 4.0).sqrt();
        assert!((node.uct_value(16, 2.0) - expected).abs() < 1e-12);
        assert!((node.uct_value(16, 0.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn record_credits_the_mover() {
        let mut node = MctsNode::new(GameState::default(), None, Player::One, 1);
        node.record(GameOutcome::Win(Player::One));
        node.record(GameOutcome::Win(Player::Two));
        node.record(GameOutcome::Draw);

        assert_eq!(node.visits, 3);
        assert!((node.wins - 1.5).abs() < 1e-12);
        assert!((node.wins_rate() - 0.5).abs() < 1e-12);
    }
}
