//! Geometry engine - shape matrices, rotation, collision, and movement
//!
//! Pure functions over well-formed inputs. Shapes are rectangular occupancy
//! matrices (up to 5x5) whose non-zero cells carry the board cell value they
//! lock as; ragged input cannot be constructed through [`ShapeGrid`]'s API.

use crate::core::board::Board;
use crate::core::piece::Piece;
use crate::types::{BOARD_HEIGHT, BOARD_WIDTH};

/// Maximum shape side length
pub const MAX_SHAPE: usize = 5;

/// A rectangular occupancy matrix. Cell values are board cell values
/// (0 = empty); dimensions swap under rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeGrid {
    rows: u8,
    cols: u8,
    cells: [[u8; MAX_SHAPE]; MAX_SHAPE],
}

impl ShapeGrid {
    /// Build a grid from row slices.
    ///
    /// Precondition: every row has the same length, 1..=5 rows and columns.
    /// Malformed input is a programming error, checked only in debug builds.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        debug_assert!(!rows.is_empty() && rows.len() <= MAX_SHAPE);
        debug_assert!(rows.iter().all(|r| r.len() == rows[0].len()));
        debug_assert!(!rows[0].is_empty() && rows[0].len() <= MAX_SHAPE);

        let mut cells = [[0u8; MAX_SHAPE]; MAX_SHAPE];
        for (r, row) in rows.iter().enumerate() {
            cells[r][..row.len()].copy_from_slice(row);
        }
        Self {
            rows: rows.len() as u8,
            cols: rows[0].len() as u8,
            cells,
        }
    }

    pub fn rows(&self) -> i16 {
        self.rows as i16
    }

    pub fn cols(&self) -> i16 {
        self.cols as i16
    }

    /// Cell value at (row, col); 0 when empty
    pub fn cell(&self, row: i16, col: i16) -> u8 {
        self.cells[row as usize][col as usize]
    }

    pub fn set_cell(&mut self, row: i16, col: i16, value: u8) {
        self.cells[row as usize][col as usize] = value;
    }

    /// Iterate the non-zero cells as (row, col, value)
    pub fn occupied(&self) -> impl Iterator<Item = (i16, i16, u8)> + '_ {
        (0..self.rows()).flat_map(move |r| {
            (0..self.cols()).filter_map(move |c| {
                let v = self.cell(r, c);
                (v != 0).then_some((r, c, v))
            })
        })
    }

    /// 90-degree rotation (transpose and reverse rows); dimensions swap.
    pub fn rotated(&self) -> ShapeGrid {
        let mut out = ShapeGrid {
            rows: self.cols,
            cols: self.rows,
            cells: [[0u8; MAX_SHAPE]; MAX_SHAPE],
        };
        for r in 0..out.rows() {
            for c in 0..out.cols() {
                out.cells[r as usize][c as usize] = self.cell(self.rows() - 1 - c, r);
            }
        }
        out
    }
}

/// Collision test against the board.
///
/// For every non-zero shape cell at (row, col) the target board coordinate is
/// (x + col + dx, y + row + dy). Collision when the column leaves [0, width),
/// the row reaches the floor, or an in-bounds target cell is occupied. The
/// same function serves look-ahead probing (arbitrary deltas) and the
/// committed-position check (deltas 0), so the boundary math cannot drift
/// between the two.
pub fn collides(board: &Board, grid: &ShapeGrid, x: i16, y: i16, dx: i16, dy: i16) -> bool {
    for (row, col, _) in grid.occupied() {
        let bx = x + col + dx;
        let by = y + row + dy;
        if bx < 0 || bx >= BOARD_WIDTH {
            return true;
        }
        if by >= BOARD_HEIGHT {
            return true;
        }
        if board.cell(bx, by) != 0 {
            return true;
        }
    }
    false
}

pub fn can_move_left(board: &Board, piece: &Piece) -> bool {
    !collides(board, &piece.grid, piece.x, piece.y, -1, 0)
}

pub fn can_move_right(board: &Board, piece: &Piece) -> bool {
    !collides(board, &piece.grid, piece.x, piece.y, 1, 0)
}

pub fn can_move_down(board: &Board, piece: &Piece) -> bool {
    !collides(board, &piece.grid, piece.x, piece.y, 0, 1)
}

/// Shift the piece by (dx, dy) if the candidate position is clear.
///
/// The candidate is validated before commit, so the piece is never observable
/// in an illegal position, even transiently.
fn try_shift(board: &Board, piece: &mut Piece, dx: i16, dy: i16) -> bool {
    let (cx, cy) = (piece.x + dx, piece.y + dy);
    if collides(board, &piece.grid, cx, cy, 0, 0) {
        return false;
    }
    piece.x = cx;
    piece.y = cy;
    true
}

pub fn move_left(board: &Board, piece: &mut Piece) -> bool {
    try_shift(board, piece, -1, 0)
}

pub fn move_right(board: &Board, piece: &mut Piece) -> bool {
    try_shift(board, piece, 1, 0)
}

pub fn move_down(board: &Board, piece: &mut Piece) -> bool {
    try_shift(board, piece, 0, 1)
}

/// Rotate the piece in place if its rotated form fits.
///
/// Fixed-orientation pieces (Weight) never rotate.
pub fn try_rotate(board: &Board, piece: &mut Piece) -> bool {
    if !piece.rotatable {
        return false;
    }
    let rotated = piece.grid.rotated();
    if collides(board, &rotated, piece.x, piece.y, 0, 0) {
        return false;
    }
    piece.grid = rotated;
    true
}

/// Number of rows the piece can fall before resting.
pub fn drop_distance(board: &Board, piece: &Piece) -> i16 {
    let mut dist: i16 = 0;
    while !collides(board, &piece.grid, piece.x, piece.y, 0, dist + 1) {
        dist += 1;
    }
    dist
}

/// Drop the piece to its maximal safe offset in a single commit.
///
/// Returns the distance fallen. The resting row equals what repeated
/// single-step downward moves would reach.
pub fn hard_drop(board: &Board, piece: &mut Piece) -> i16 {
    let dist = drop_distance(board, piece);
    piece.y += dist;
    dist
}
