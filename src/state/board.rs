//! Board model.
//!
//! The puzzle is a 4x4 grid holding every value in `0..16` exactly once.
//! [`VOID_CELL`] marks the empty slot; a tile can only slide into it from an
//! orthogonal neighbor.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Board width and height.
pub const BOARD_SIZE: usize = 4;

/// Number of cells on the board.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Value marking the empty cell.
pub const VOID_CELL: u8 = 15;

/// Board coordinate. `x` is the column, `y` the row.
///
/// Serialized as an `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Check if position is within the board.
    pub fn is_valid(&self) -> bool {
        self.x < BOARD_SIZE && self.y < BOARD_SIZE
    }

    /// Offset by a signed delta, `None` when the result leaves the board.
    pub fn offset(&self, dx: i32, dy: i32) -> Option<Position> {
        let x = self.x.checked_add_signed(isize::try_from(dx).ok()?)?;
        let y = self.y.checked_add_signed(isize::try_from(dy).ok()?)?;
        Some(Position::new(x, y)).filter(Position::is_valid)
    }

    /// Orthogonal neighbors in scan order: left, right, up, down.
    ///
    /// Off-board neighbors are skipped.
    pub fn neighbors(&self) -> impl Iterator<Item = Position> {
        let origin = *self;
        [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .into_iter()
            .filter_map(move |(dx, dy)| origin.offset(dx, dy))
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl From<Position> for (usize, usize) {
    fn from(pos: Position) -> Self {
        (pos.x, pos.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Errors building a board from untrusted rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board must have 4 rows, got {0}")]
    RowCount(usize),
    #[error("row {row} must have 4 cells, got {len}")]
    RowLength { row: usize, len: usize },
    #[error("cell value {0} is out of range")]
    ValueOutOfRange(u8),
    #[error("cell value {0} appears more than once")]
    Duplicate(u8),
}

/// The 4x4 tile arrangement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Board {
    cells: [[u8; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::solved()
    }
}

impl Board {
    /// The solved arrangement: `0..15` in row-major order, empty cell last.
    pub fn solved() -> Self {
        let mut cells = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        for (y, row) in cells.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = (y * BOARD_SIZE + x) as u8;
            }
        }
        Self { cells }
    }

    /// Build a board from rows, validating it is a permutation of `0..16`.
    pub fn from_rows(rows: [[u8; BOARD_SIZE]; BOARD_SIZE]) -> Result<Self, BoardError> {
        let board = Self { cells: rows };
        board.validate()?;
        Ok(board)
    }

    fn validate(&self) -> Result<(), BoardError> {
        let mut seen = [false; CELL_COUNT];
        for &value in self.cells.iter().flatten() {
            let slot = seen
                .get_mut(value as usize)
                .ok_or(BoardError::ValueOutOfRange(value))?;
            if *slot {
                return Err(BoardError::Duplicate(value));
            }
            *slot = true;
        }
        Ok(())
    }

    /// Check the board still holds every value exactly once.
    pub fn is_permutation(&self) -> bool {
        self.validate().is_ok()
    }

    /// Rows of the board.
    pub fn rows(&self) -> &[[u8; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Get the value at a position.
    pub fn cell(&self, pos: Position) -> Option<u8> {
        if pos.is_valid() {
            Some(self.cells[pos.y][pos.x])
        } else {
            None
        }
    }

    /// Position currently holding [`VOID_CELL`].
    pub fn empty_cell(&self) -> Position {
        self.position_of(VOID_CELL)
            .unwrap_or_else(|| Position::new(BOARD_SIZE - 1, BOARD_SIZE - 1))
    }

    /// Position of a tile value.
    pub fn position_of(&self, value: u8) -> Option<Position> {
        self.cells.iter().enumerate().find_map(|(y, row)| {
            row.iter()
                .position(|&cell| cell == value)
                .map(|x| Position::new(x, y))
        })
    }

    /// Check if every cell holds its own row-major index.
    pub fn is_solved(&self) -> bool {
        self.cells.iter().enumerate().all(|(y, row)| {
            row.iter()
                .enumerate()
                .all(|(x, &cell)| cell as usize == y * BOARD_SIZE + x)
        })
    }

    /// Slide the tile at `pos` into an adjacent empty cell.
    ///
    /// Returns the resulting board and whether a tile moved. Clicking the
    /// empty cell, an off-board position, or a tile with no empty neighbor
    /// leaves the board unchanged.
    pub fn attempt_move(&self, pos: Position) -> (Board, bool) {
        let mut next = self.clone();

        match self.cell(pos) {
            Some(value) if value != VOID_CELL => {
                let target = pos
                    .neighbors()
                    .find(|n| self.cells[n.y][n.x] == VOID_CELL);
                match target {
                    Some(n) => {
                        next.cells[n.y][n.x] = value;
                        next.cells[pos.y][pos.x] = VOID_CELL;
                        (next, true)
                    }
                    None => (next, false),
                }
            }
            _ => (next, false),
        }
    }

    /// Convert to JSON rows.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.cells)
    }
}

impl TryFrom<Vec<Vec<u8>>> for Board {
    type Error = BoardError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        if rows.len() != BOARD_SIZE {
            return Err(BoardError::RowCount(rows.len()));
        }
        let mut cells = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        for (y, row) in rows.iter().enumerate() {
            if row.len() != BOARD_SIZE {
                return Err(BoardError::RowLength {
                    row: y,
                    len: row.len(),
                });
            }
            cells[y].copy_from_slice(row);
        }
        Board::from_rows(cells)
    }
}

impl From<Board> for Vec<Vec<u8>> {
    fn from(board: Board) -> Self {
        board.cells.iter().map(|row| row.to_vec()).collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row
                .iter()
                .map(|&cell| {
                    if cell == VOID_CELL {
                        " .".to_string()
                    } else {
                        format!("{:2}", cell)
                    }
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
