//! Piece catalog - the seven standard tetrominoes plus the four item pieces
//!
//! Item pieces ride a standard host shape with one marker-valued cell (the
//! Weight is all marker). The marker value survives into the board when the
//! piece locks, which is how the lock routine discovers pending item effects.

use serde::{Deserialize, Serialize};

use crate::core::shape::ShapeGrid;
use crate::types::{
    Rgb, BOARD_WIDTH, CELL_I, CELL_J, CELL_L, CELL_O, CELL_S, CELL_T, CELL_Z, MARKER_BOX_CLEAR,
    MARKER_ONE_LINE, MARKER_SCORE_DOUBLE, MARKER_WEIGHT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
    /// T host, clears a 3x3 neighborhood around its marker on lock
    BoxClear,
    /// I host, clears the row its marker locks into
    OneLineClear,
    /// O host, doubles the score of the clear it participates in
    ScoreDouble,
    /// 2x4 slab, fixed orientation, crushes the columns beneath it
    Weight,
}

impl PieceKind {
    pub fn is_item(self) -> bool {
        matches!(
            self,
            PieceKind::BoxClear | PieceKind::OneLineClear | PieceKind::ScoreDouble | PieceKind::Weight
        )
    }

    /// Board cell value this kind locks as (items report their host value)
    pub fn cell_value(self) -> u8 {
        match self {
            PieceKind::I | PieceKind::OneLineClear => CELL_I,
            PieceKind::J => CELL_J,
            PieceKind::L => CELL_L,
            PieceKind::O | PieceKind::ScoreDouble => CELL_O,
            PieceKind::S => CELL_S,
            PieceKind::T | PieceKind::BoxClear => CELL_T,
            PieceKind::Z => CELL_Z,
            PieceKind::Weight => MARKER_WEIGHT,
        }
    }

    /// The Weight keeps its orientation; everything else rotates.
    pub fn rotatable(self) -> bool {
        !matches!(self, PieceKind::Weight)
    }

    pub fn base_grid(self) -> ShapeGrid {
        let i = CELL_I;
        let j = CELL_J;
        let l = CELL_L;
        let o = CELL_O;
        let s = CELL_S;
        let t = CELL_T;
        let z = CELL_Z;
        let w = MARKER_WEIGHT;
        match self {
            PieceKind::I => ShapeGrid::from_rows(&[&[i, i, i, i]]),
            PieceKind::J => ShapeGrid::from_rows(&[&[j, 0, 0], &[j, j, j]]),
            PieceKind::L => ShapeGrid::from_rows(&[&[0, 0, l], &[l, l, l]]),
            PieceKind::O => ShapeGrid::from_rows(&[&[o, o], &[o, o]]),
            PieceKind::S => ShapeGrid::from_rows(&[&[0, s, s], &[s, s, 0]]),
            PieceKind::T => ShapeGrid::from_rows(&[&[0, t, 0], &[t, t, t]]),
            PieceKind::Z => ShapeGrid::from_rows(&[&[z, z, 0], &[0, z, z]]),
            PieceKind::OneLineClear => {
                ShapeGrid::from_rows(&[&[i, MARKER_ONE_LINE, i, i]])
            }
            PieceKind::ScoreDouble => {
                ShapeGrid::from_rows(&[&[o, MARKER_SCORE_DOUBLE], &[o, o]])
            }
            PieceKind::BoxClear => {
                ShapeGrid::from_rows(&[&[0, t, 0], &[t, MARKER_BOX_CLEAR, t]])
            }
            PieceKind::Weight => ShapeGrid::from_rows(&[&[0, w, w, 0], &[w, w, w, w]]),
        }
    }

    /// Display color; the colorblind palette trades hue spread for
    /// luminance contrast.
    pub fn color(self, colorblind: bool) -> Rgb {
        if colorblind {
            match self {
                PieceKind::I | PieceKind::OneLineClear => Rgb(0, 114, 178),
                PieceKind::J => Rgb(86, 180, 233),
                PieceKind::L => Rgb(230, 159, 0),
                PieceKind::O | PieceKind::ScoreDouble => Rgb(240, 228, 66),
                PieceKind::S => Rgb(0, 158, 115),
                PieceKind::T | PieceKind::BoxClear => Rgb(204, 121, 167),
                PieceKind::Z => Rgb(213, 94, 0),
                PieceKind::Weight => Rgb(153, 153, 153),
            }
        } else {
            match self {
                PieceKind::I | PieceKind::OneLineClear => Rgb(0, 240, 240),
                PieceKind::J => Rgb(0, 0, 240),
                PieceKind::L => Rgb(240, 160, 0),
                PieceKind::O | PieceKind::ScoreDouble => Rgb(240, 240, 0),
                PieceKind::S => Rgb(0, 240, 0),
                PieceKind::T | PieceKind::BoxClear => Rgb(160, 0, 240),
                PieceKind::Z => Rgb(240, 0, 0),
                PieceKind::Weight => Rgb(128, 128, 128),
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::J => "J",
            PieceKind::L => "L",
            PieceKind::O => "O",
            PieceKind::S => "S",
            PieceKind::T => "T",
            PieceKind::Z => "Z",
            PieceKind::BoxClear => "BOX_CLEAR",
            PieceKind::OneLineClear => "ONE_LINE_CLEAR",
            PieceKind::ScoreDouble => "SCORE_DOUBLE",
            PieceKind::Weight => "WEIGHT",
        }
    }
}

/// An active falling piece. `(x, y)` anchors the shape grid's top-left cell
/// in playfield coordinates.
#[derive(Debug, Clone)]
pub struct Piece {
    pub kind: PieceKind,
    pub grid: ShapeGrid,
    pub x: i16,
    pub y: i16,
    pub color: Rgb,
    pub rotatable: bool,
}

impl Piece {
    /// Spawn at the top of the playfield, horizontally centered.
    pub fn spawn(kind: PieceKind, colorblind: bool) -> Self {
        let grid = kind.base_grid();
        let x = (BOARD_WIDTH - grid.cols()) / 2;
        Self {
            kind,
            grid,
            x,
            y: 0,
            color: kind.color(colorblind),
            rotatable: kind.rotatable(),
        }
    }
}
