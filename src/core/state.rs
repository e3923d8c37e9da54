//! Render-ready player state
//!
//! A [`GameSnapshot`] is a flat copy of everything a display or peer needs,
//! with the active piece already composited into the cell plane. The engine
//! refills snapshots in place so steady-state play does not reallocate.

use serde::{Deserialize, Serialize};

use crate::core::board::Board;
use crate::core::piece::{Piece, PieceKind};
use crate::types::{PlayerId, Rgb, BOARD_HEIGHT, BOARD_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Ready,
    Playing,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub player: PlayerId,
    pub phase: GamePhase,
    /// Visible playfield row-major, active piece composited in
    pub cells: Vec<u8>,
    pub colors: Vec<Rgb>,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    pub next: Option<PieceKind>,
    /// Garbage lines currently owed to this player
    pub pending_attack_lines: u32,
    /// Rows mid line-clear flash, top first
    pub flashing_rows: Vec<i16>,
    pub box_clear_flash: bool,
    pub all_clear_flash: bool,
    /// Alternates every step while something is flashing
    pub flash_phase: bool,
    pub tick: u64,
}

impl GameSnapshot {
    pub fn empty(player: PlayerId) -> Self {
        let n = (BOARD_WIDTH * BOARD_HEIGHT) as usize;
        Self {
            player,
            phase: GamePhase::Ready,
            cells: vec![0; n],
            colors: vec![Rgb::BLACK; n],
            score: 0,
            lines: 0,
            level: 0,
            next: None,
            pending_attack_lines: 0,
            flashing_rows: Vec::new(),
            box_clear_flash: false,
            all_clear_flash: false,
            flash_phase: false,
            tick: 0,
        }
    }

    pub fn builder(player: PlayerId) -> SnapshotBuilder {
        SnapshotBuilder {
            snap: Self::empty(player),
        }
    }

    #[inline]
    pub fn cell_at(&self, x: i16, y: i16) -> u8 {
        self.cells[(y * BOARD_WIDTH + x) as usize]
    }

    pub(crate) fn fill_board(&mut self, board: &Board) {
        for y in 0..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                let i = (y * BOARD_WIDTH + x) as usize;
                self.cells[i] = board.cell(x, y);
                self.colors[i] = board.color(x, y);
            }
        }
    }

    pub(crate) fn compose_piece(&mut self, piece: &Piece) {
        for (row, col, value) in piece.grid.occupied() {
            let (x, y) = (piece.x + col, piece.y + row);
            if (0..BOARD_WIDTH).contains(&x) && (0..BOARD_HEIGHT).contains(&y) {
                let i = (y * BOARD_WIDTH + x) as usize;
                self.cells[i] = value;
                self.colors[i] = piece.color;
            }
        }
    }
}

/// Assembles a [`GameSnapshot`] field by field.
///
/// Starts from the empty snapshot, so anything not set stays at its
/// default. The board plane goes in first and the active piece is
/// composited on top of it.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snap: GameSnapshot,
}

impl SnapshotBuilder {
    pub fn phase(mut self, phase: GamePhase) -> Self {
        self.snap.phase = phase;
        self
    }

    pub fn score(mut self, score: u32) -> Self {
        self.snap.score = score;
        self
    }

    pub fn lines(mut self, lines: u32) -> Self {
        self.snap.lines = lines;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.snap.level = level;
        self
    }

    pub fn next(mut self, next: Option<PieceKind>) -> Self {
        self.snap.next = next;
        self
    }

    pub fn pending_attack_lines(mut self, lines: u32) -> Self {
        self.snap.pending_attack_lines = lines;
        self
    }

    pub fn flashing_rows(mut self, rows: &[i16]) -> Self {
        self.snap.flashing_rows.clear();
        self.snap.flashing_rows.extend_from_slice(rows);
        self
    }

    pub fn flashes(mut self, box_clear: bool, all_clear: bool, phase: bool) -> Self {
        self.snap.box_clear_flash = box_clear;
        self.snap.all_clear_flash = all_clear;
        self.snap.flash_phase = phase;
        self
    }

    pub fn tick(mut self, tick: u64) -> Self {
        self.snap.tick = tick;
        self
    }

    pub fn board(mut self, board: &Board) -> Self {
        self.snap.fill_board(board);
        self
    }

    pub fn active_piece(mut self, piece: &Piece) -> Self {
        self.snap.compose_piece(piece);
        self
    }

    pub fn build(self) -> GameSnapshot {
        self.snap
    }
}
