//! Playfield storage - flat cell array with a hidden margin above row 0
//!
//! Only the top margin is backed by storage; left, right and floor bounds
//! are enforced arithmetically by the collision checks in
//! [`crate::core::shape`], so out-of-field probes never touch the array.
//!
//! Cells hold the values from [`crate::types`] (0 empty, 1..=7 locked
//! tetromino cells, 8 attack garbage, 9..=12 item markers). A parallel color
//! plane keeps the display color of each locked cell so snapshots can render
//! without knowing which piece produced a cell.

use arrayvec::ArrayVec;

use crate::types::{Rgb, BOARD_BORDER, BOARD_HEIGHT, BOARD_WIDTH, CELL_ATTACK};

const W: usize = BOARD_WIDTH as usize;
const H: usize = BOARD_HEIGHT as usize;
/// Hidden rows above the visible playfield where fresh pieces overhang
const TOP: usize = BOARD_BORDER as usize;
const TOTAL: usize = W * (H + TOP);

pub const MAX_ROWS: usize = H;

#[derive(Clone)]
pub struct Board {
    cells: [u8; TOTAL],
    colors: [Rgb; TOTAL],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [0; TOTAL],
            colors: [Rgb::BLACK; TOTAL],
        }
    }

    /// Flat index for playfield coordinates; y may reach up into the margin.
    #[inline]
    fn idx(x: i16, y: i16) -> usize {
        debug_assert!((0..BOARD_WIDTH).contains(&x));
        debug_assert!((-BOARD_BORDER..BOARD_HEIGHT).contains(&y));
        (y + BOARD_BORDER) as usize * W + x as usize
    }

    #[inline]
    pub fn cell(&self, x: i16, y: i16) -> u8 {
        self.cells[Self::idx(x, y)]
    }

    #[inline]
    pub fn color(&self, x: i16, y: i16) -> Rgb {
        self.colors[Self::idx(x, y)]
    }

    #[inline]
    pub fn set_cell(&mut self, x: i16, y: i16, value: u8) {
        self.cells[Self::idx(x, y)] = value;
    }

    pub fn set_cell_colored(&mut self, x: i16, y: i16, value: u8, color: Rgb) {
        let i = Self::idx(x, y);
        self.cells[i] = value;
        self.colors[i] = color;
    }

    pub fn clear_cell(&mut self, x: i16, y: i16) {
        let i = Self::idx(x, y);
        self.cells[i] = 0;
        self.colors[i] = Rgb::BLACK;
    }

    /// Visible-row contents, leftmost column first
    pub fn row_cells(&self, y: i16) -> [u8; W] {
        let start = Self::idx(0, y);
        let mut row = [0u8; W];
        row.copy_from_slice(&self.cells[start..start + W]);
        row
    }

    /// Rows inside the visible playfield with no empty cell, top first
    pub fn full_rows(&self) -> ArrayVec<i16, MAX_ROWS> {
        let mut rows = ArrayVec::new();
        for y in 0..BOARD_HEIGHT {
            if (0..BOARD_WIDTH).all(|x| self.cell(x, y) != 0) {
                rows.push(y);
            }
        }
        rows
    }

    /// Remove the given rows and compact everything above them downward.
    ///
    /// `rows` must be sorted ascending (as produced by [`full_rows`]).
    ///
    /// [`full_rows`]: Board::full_rows
    pub fn clear_rows(&mut self, rows: &[i16]) {
        for &row in rows {
            let mut y = row;
            while y > -BOARD_BORDER {
                for x in 0..BOARD_WIDTH {
                    let above = Self::idx(x, y - 1);
                    let here = Self::idx(x, y);
                    self.cells[here] = self.cells[above];
                    self.colors[here] = self.colors[above];
                }
                y -= 1;
            }
            for x in 0..BOARD_WIDTH {
                let top = Self::idx(x, -BOARD_BORDER);
                self.cells[top] = 0;
                self.colors[top] = Rgb::BLACK;
            }
        }
    }

    /// Push the stack up and insert attack rows at the bottom.
    ///
    /// Within a pattern row, zero cells stay as holes and non-zero cells
    /// become garbage. Rows narrower than `BOARD_WIDTH` are anchored at
    /// `offset` (clamped so they fit) and padded with garbage on either
    /// side; full-width rows land as-is. Patterns are inserted in order,
    /// the first ending up highest. Cells pushed past the top margin are
    /// lost; the caller decides whether that tops the player out.
    pub fn insert_attack_rows(&mut self, patterns: &[Vec<u8>], offset: i16, color: Rgb) {
        for pattern in patterns {
            let width = pattern.len() as i16;
            let start = offset.clamp(0, (BOARD_WIDTH - width).max(0));
            // shift everything up one row
            for y in -BOARD_BORDER + 1..BOARD_HEIGHT {
                for x in 0..BOARD_WIDTH {
                    let here = Self::idx(x, y);
                    let above = Self::idx(x, y - 1);
                    self.cells[above] = self.cells[here];
                    self.colors[above] = self.colors[here];
                }
            }
            for x in 0..BOARD_WIDTH {
                let i = Self::idx(x, BOARD_HEIGHT - 1);
                let in_span = x >= start && x < start + width;
                let hole = in_span && pattern[(x - start) as usize] == 0;
                if hole {
                    self.cells[i] = 0;
                    self.colors[i] = Rgb::BLACK;
                } else {
                    self.cells[i] = CELL_ATTACK;
                    self.colors[i] = color;
                }
            }
        }
    }

    /// Clear the 3x3 neighborhood centered on (cx, cy), clamped to the
    /// visible playfield. Returns how many occupied cells were destroyed.
    pub fn clear_box(&mut self, cx: i16, cy: i16) -> usize {
        let mut cleared = 0;
        for y in (cy - 1).max(0)..=(cy + 1).min(BOARD_HEIGHT - 1) {
            for x in (cx - 1).max(0)..=(cx + 1).min(BOARD_WIDTH - 1) {
                if self.cell(x, y) != 0 {
                    self.clear_cell(x, y);
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Clear an inclusive vertical span of one column. Returns the number of
    /// occupied cells destroyed.
    pub fn clear_column_range(&mut self, x: i16, y0: i16, y1: i16) -> usize {
        let mut cleared = 0;
        for y in y0.max(0)..=y1.min(BOARD_HEIGHT - 1) {
            if self.cell(x, y) != 0 {
                self.clear_cell(x, y);
                cleared += 1;
            }
        }
        cleared
    }

    /// True when no visible cell is occupied
    pub fn is_playfield_empty(&self) -> bool {
        (0..BOARD_HEIGHT).all(|y| (0..BOARD_WIDTH).all(|x| self.cell(x, y) == 0))
    }

    /// Occupied cell count in the visible playfield
    pub fn occupied_count(&self) -> usize {
        (0..BOARD_HEIGHT)
            .flat_map(|y| (0..BOARD_WIDTH).map(move |x| (x, y)))
            .filter(|&(x, y)| self.cell(x, y) != 0)
            .count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
