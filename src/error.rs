use crate::board::{Coord, GameOutcome};
use thiserror::Error;

/// Errors returned while building positions or starting a search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MctsError {
    #[error("board has {0} cells, expected a non-zero square number")]
    InvalidLength(usize),

    #[error("cell {index} holds {value}, expected 0, 1 or 2")]
    InvalidCell { index: usize, value: u8 },

    #[error("token {0:?} is not a cell value")]
    InvalidToken(String),

    #[error("player id {0} is not 1 or 2")]
    InvalidPlayer(u8),

    #[error("both players have a winning line")]
    ConflictingWinners,

    #[error("{coord} is outside a {size}x{size} board")]
    OutOfBounds { coord: Coord, size: usize },

    #[error("{0} is already occupied")]
    CellOccupied(Coord),

    #[error("no legal moves, game is over: {0:?}")]
    NoLegalMoves(GameOutcome),

    #[error("neither an iteration budget nor a time budget is configured")]
    NoBudgetConfigured,

    #[error("exploration constant {0} must be finite and non-negative")]
    InvalidExplorationConstant(f64),
}

/// Convenience result type for this crate.
pub type Result<T> = std::result::Result<T, MctsError>;
