use crate::error::{MctsError, Result};
use std::fmt;

/// Side length of the classic tic-tac-toe board.
pub const DEFAULT_BOARD_SIZE: usize = 3;

/// One of the two players. The discriminants match the cell values of the flat board format.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Player {
    /// Player one, rendered as `X`.
    One = 1,
    /// Player two, rendered as `O`.
    Two = 2,
}

impl Player {
    /// Returns the other player.
    pub const fn opponent(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Returns the numeric id used in the flat board format.
    pub const fn id(self) -> u8 {
        self as u8
    }

    const fn symbol(self) -> char {
        match self {
            Player::One => 'X',
            Player::Two => 'O',
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = MctsError;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(MctsError::InvalidPlayer(other)),
        }
    }
}

/// The state of a game as seen from the board alone.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum GameOutcome {
    /// At least one cell is empty and nobody owns a line.
    InProgress,
    /// The board is full and nobody owns a line.
    Draw,
    /// The player owns a complete row, column or main diagonal.
    Win(Player),
}

impl GameOutcome {
    /// Returns `true` for a drawn or won game.
    pub const fn is_over(self) -> bool {
        !matches!(self, GameOutcome::InProgress)
    }

    /// Returns the winning player, if any.
    pub const fn winner(self) -> Option<Player> {
        match self {
            GameOutcome::Win(player) => Some(player),
            _ => None,
        }
    }
}

/// A zero-indexed board coordinate. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// An immutable snapshot of an N×N board and the player to move.
///
/// Every transition returns a new state, so positions held by different branches of the search
/// tree never alias each other. Constructors reject boards on which both players own a line,
/// and moves cannot be played once the game is decided, so a state reports at most one winner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameState {
    size: usize,
    cells: Vec<Option<Player>>,
    to_move: Player,
}

impl Default for GameState {
    /// An empty 3×3 board with player one to move.
    fn default() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
            cells: vec![None; DEFAULT_BOARD_SIZE * DEFAULT_BOARD_SIZE],
            to_move: Player::One,
        }
    }
}

impl GameState {
    /// Creates an empty `size`×`size` board with player one to move.
    pub fn empty(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(MctsError::InvalidLength(0));
        }
        Ok(Self {
            size,
            cells: vec![None; size * size],
            to_move: Player::One,
        })
    }

    /// Builds a state from a row-major sequence of N² cell values (0 empty, 1 and 2 players).
    ///
    /// The board side is inferred from the length of `values`.
    pub fn from_flat(values: &[u8], to_move: Player) -> Result<Self> {
        let size = square_side(values.len()).ok_or(MctsError::InvalidLength(values.len()))?;
        let cells = values
            .iter()
            .enumerate()
            .map(|(index, &value)| match value {
                0 => Ok(None),
                1 => Ok(Some(Player::One)),
                2 => Ok(Some(Player::Two)),
                _ => Err(MctsError::InvalidCell { index, value }),
            })
            .collect::<Result<Vec<_>>>()?;

        Self {
            size,
            cells,
            to_move,
        }
        .validated()
    }

    /// Builds a state from rows of cell values. Every row must be as long as the number of rows.
    pub fn from_grid<R: AsRef<[u8]>>(rows: &[R], to_move: Player) -> Result<Self> {
        let side = rows.len();
        let total: usize = rows.iter().map(|row| row.as_ref().len()).sum();
        if rows.iter().any(|row| row.as_ref().len() != side) {
            return Err(MctsError::InvalidLength(total));
        }

        let flat: Vec<u8> = rows
            .iter()
            .flat_map(|row| row.as_ref().iter().copied())
            .collect();
        Self::from_flat(&flat, to_move)
    }

    /// Builds a state from whitespace-separated cell values, e.g. `"1 1 0 2 2 0 0 0 0"`.
    pub fn from_text(text: &str, to_move: Player) -> Result<Self> {
        let values = text
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<u8>()
                    .map_err(|_| MctsError::InvalidToken(token.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_flat(&values, to_move)
    }

    /// Returns the cells as flat row-major values, the inverse of [`GameState::from_flat`].
    pub fn to_flat(&self) -> Vec<u8> {
        self.cells
            .iter()
            .map(|cell| cell.map_or(0, Player::id))
            .collect()
    }

    /// Side length of the board.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The player whose turn it is.
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// Returns the occupant of `coord`; `None` for an empty cell or a coordinate off the board.
    pub fn get(&self, coord: Coord) -> Option<Player> {
        self.index_of(coord).ok().and_then(|index| self.cells[index])
    }

    /// Places `player` on `coord` and returns the resulting state, handing the turn to the opponent.
    pub fn apply_move(&self, coord: Coord, player: Player) -> Result<Self> {
        let index = self.index_of(coord)?;
        if self.cells[index].is_some() {
            return Err(MctsError::CellOccupied(coord));
        }

        let outcome = self.outcome();
        if outcome.is_over() {
            return Err(MctsError::NoLegalMoves(outcome));
        }

        let mut cells = self.cells.clone();
        cells[index] = Some(player);
        Ok(Self {
            size: self.size,
            cells,
            to_move: player.opponent(),
        })
    }

    /// Plays `coord` for the player to move.
    pub fn play(&self, coord: Coord) -> Result<Self> {
        self.apply_move(coord, self.to_move)
    }

    /// Evaluates every row, column and both main diagonals.
    pub fn outcome(&self) -> GameOutcome {
        if let Some(player) = self.line_owners().next() {
            return GameOutcome::Win(player);
        }

        if self.cells.iter().all(Option::is_some) {
            GameOutcome::Draw
        } else {
            GameOutcome::InProgress
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_over()
    }

    /// Returns the empty cells in row-major order, or nothing once the game is decided.
    pub fn legal_moves(&self) -> Vec<Coord> {
        if self.is_terminal() {
            return Vec::new();
        }

        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| self.coord_of(index))
            .collect()
    }

    fn index_of(&self, coord: Coord) -> Result<usize> {
        if coord.row >= self.size || coord.col >= self.size {
            return Err(MctsError::OutOfBounds {
                coord,
                size: self.size,
            });
        }
        Ok(coord.row * self.size + coord.col)
    }

    fn coord_of(&self, index: usize) -> Coord {
        Coord::new(index / self.size, index % self.size)
    }

    /// Yields the owner of every complete line: rows, then columns, then the two diagonals.
    fn line_owners(&self) -> impl Iterator<Item = Player> + '_ {
        let n = self.size;
        let rows = (0..n).filter_map(move |r| self.line_owner((0..n).map(move |c| r * n + c)));
        let cols = (0..n).filter_map(move |c| self.line_owner((0..n).map(move |r| r * n + c)));
        let diagonal = self.line_owner((0..n).map(move |i| i * n + i));
        let anti_diagonal = self.line_owner((0..n).map(move |i| i * n + (n - 1 - i)));
        rows.chain(cols).chain(diagonal).chain(anti_diagonal)
    }

    fn line_owner(&self, mut indices: impl Iterator<Item = usize>) -> Option<Player> {
        let first = self.cells[indices.next()?]?;
        indices
            .all(|index| self.cells[index] == Some(first))
            .then_some(first)
    }

    fn validated(self) -> Result<Self> {
        let conflicting = {
            let mut owners = self.line_owners();
            match owners.next() {
                Some(first) => owners.any(|player| player != first),
                None => false,
            }
        };

        if conflicting {
            Err(MctsError::ConflictingWinners)
        } else {
            Ok(self)
        }
    }
}

fn square_side(len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let side = len.isqrt();
    (side * side == len).then_some(side)
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.size) {
            let line: Vec<String> = row
                .iter()
                .map(|cell| cell.map_or('.', Player::symbol).to_string())
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(values: &[u8]) -> GameState {
        GameState::from_flat(values, Player::One).unwrap()
    }

    #[test]
    fn flat_round_trip() {
        let values = [1, 2, 0, 0, 1, 0, 2, 0, 0];
        assert_eq!(state(&values).to_flat(), values);
    }

    #[test]
    fn rejects_non_square_length() {
        assert_eq!(
            GameState::from_flat(&[0; 8], Player::One),
            Err(MctsError::InvalidLength(8))
        );
        assert_eq!(
            GameState::from_flat(&[], Player::One),
            Err(MctsError::InvalidLength(0))
        );
    }

    #[test]
    fn rejects_unknown_cell_value() {
        assert_eq!(
            GameState::from_flat(&[0, 0, 0, 0, 3, 0, 0, 0, 0], Player::One),
            Err(MctsError::InvalidCell { index: 4, value: 3 })
        );
    }

    #[test]
    fn rejects_two_winners() {
        assert_eq!(
            GameState::from_flat(&[1, 1, 1, 2, 2, 2, 0, 0, 0], Player::One),
            Err(MctsError::ConflictingWinners)
        );
    }

    #[test]
    fn parses_grid_and_text() {
        let grid = GameState::from_grid(&[[1u8, 1, 0], [2, 2, 0], [0, 0, 0]], Player::One).unwrap();
        let text = GameState::from_text("1 1 0\n2 2 0\n0 0 0", Player::One).unwrap();
        assert_eq!(grid, text);
        assert_eq!(grid.to_flat(), vec![1, 1, 0, 2, 2, 0, 0, 0, 0]);
    }

    #[test]
    fn rejects_ragged_grid_and_bad_tokens() {
        assert_eq!(
            GameState::from_grid(&[vec![0u8, 0, 0], vec![0u8, 0]], Player::One),
            Err(MctsError::InvalidLength(5))
        );
        assert_eq!(
            GameState::from_text("0 0 x 0", Player::One),
            Err(MctsError::InvalidToken("x".to_string()))
        );
    }

    #[test]
    fn player_ids() {
        assert_eq!(Player::try_from(1), Ok(Player::One));
        assert_eq!(Player::try_from(2), Ok(Player::Two));
        assert_eq!(Player::try_from(0), Err(MctsError::InvalidPlayer(0)));
        assert_eq!(Player::Two.opponent(), Player::One);
    }

    #[test]
    fn detects_rows_columns_and_diagonals() {
        assert_eq!(
            state(&[2, 2, 2, 1, 1, 0, 1, 0, 0]).outcome(),
            GameOutcome::Win(Player::Two)
        );
        assert_eq!(
            state(&[0, 1, 2, 0, 1, 2, 0, 1, 0]).outcome(),
            GameOutcome::Win(Player::One)
        );
        assert_eq!(
            state(&[1, 2, 0, 2, 1, 0, 0, 0, 1]).outcome(),
            GameOutcome::Win(Player::One)
        );
        assert_eq!(
            state(&[1, 1, 2, 1, 2, 0, 2, 0, 0]).outcome(),
            GameOutcome::Win(Player::Two)
        );
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let drawn = state(&[1, 2, 1, 2, 1, 2, 2, 1, 2]);
        assert_eq!(drawn.outcome(), GameOutcome::Draw);
        assert!(drawn.is_terminal());
        assert!(drawn.legal_moves().is_empty());
    }

    #[test]
    fn empty_cells_never_form_a_line() {
        let board = GameState::default();
        assert_eq!(board.outcome(), GameOutcome::InProgress);
        assert_eq!(board.legal_moves().len(), 9);
    }

    #[test]
    fn larger_boards_need_full_lines() {
        let mut board = GameState::empty(4).unwrap();
        for col in 0..3 {
            board = board.apply_move(Coord::new(0, col), Player::One).unwrap();
        }
        assert_eq!(board.outcome(), GameOutcome::InProgress);

        board = board.apply_move(Coord::new(0, 3), Player::One).unwrap();
        assert_eq!(board.outcome(), GameOutcome::Win(Player::One));
    }

    #[test]
    fn legal_moves_are_row_major() {
        let board = state(&[1, 0, 2, 0, 0, 1, 2, 0, 0]);
        assert_eq!(
            board.legal_moves(),
            vec![
                Coord::new(0, 1),
                Coord::new(1, 0),
                Coord::new(1, 1),
                Coord::new(2, 1),
                Coord::new(2, 2),
            ]
        );
    }

    #[test]
    fn apply_move_returns_new_state() {
        // arrange
        let board = GameState::default();

        // act
        let next = board.apply_move(Coord::new(1, 1), Player::One).unwrap();

        // assert
        assert_eq!(board.get(Coord::new(1, 1)), None);
        assert_eq!(next.get(Coord::new(1, 1)), Some(Player::One));
        assert_eq!(next.to_move(), Player::Two);
        assert!(!next.legal_moves().contains(&Coord::new(1, 1)));
    }

    #[test]
    fn apply_move_validates_target() {
        let board = state(&[1, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            board.apply_move(Coord::new(0, 0), Player::Two),
            Err(MctsError::CellOccupied(Coord::new(0, 0)))
        );
        assert_eq!(
            board.apply_move(Coord::new(3, 0), Player::Two),
            Err(MctsError::OutOfBounds {
                coord: Coord::new(3, 0),
                size: 3
            })
        );
    }

    #[test]
    fn no_moves_after_a_win() {
        let won = state(&[1, 1, 1, 2, 2, 0, 0, 0, 0]);
        assert!(won.legal_moves().is_empty());
        assert_eq!(
            won.apply_move(Coord::new(1, 2), Player::Two),
            Err(MctsError::NoLegalMoves(GameOutcome::Win(Player::One)))
        );
    }

    #[test]
    fn renders_rows() {
        let board = state(&[1, 0, 2, 0, 1, 0, 0, 0, 2]);
        assert_eq!(board.to_string(), "X . O\n. X .\n. . O\n");
    }
}
