//! Core types shared across the crate
//! This module contains plain data types and constants with no external dependencies

use serde::{Deserialize, Serialize};

/// Visible playfield dimensions
pub const BOARD_WIDTH: i16 = 10;
pub const BOARD_HEIGHT: i16 = 20;

/// Border margin on every side of the internal grid.
///
/// Hidden rows stored above the visible playfield, enough for the tallest
/// shape to overhang while spawning or being shoved up by garbage. Only the
/// top carries storage; wall and floor bounds are range checks in the
/// collision math.
pub const BOARD_BORDER: i16 = 5;

/// Scheduler heartbeat default (ticks per second)
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Cell values stored in the board grid.
/// 0 is empty; placed-piece values and item markers are small positive integers.
pub const CELL_EMPTY: u8 = 0;
pub const CELL_I: u8 = 1;
pub const CELL_J: u8 = 2;
pub const CELL_L: u8 = 3;
pub const CELL_O: u8 = 4;
pub const CELL_S: u8 = 5;
pub const CELL_T: u8 = 6;
pub const CELL_Z: u8 = 7;
pub const CELL_ATTACK: u8 = 8;
pub const MARKER_ONE_LINE: u8 = 9;
pub const MARKER_SCORE_DOUBLE: u8 = 10;
pub const MARKER_WEIGHT: u8 = 11;
pub const MARKER_BOX_CLEAR: u8 = 12;

/// Width of the gravity delay table
pub const SPEED_LEVELS: usize = 7;

/// Gravity delay table in milliseconds, indexed by [difficulty][speed level].
///
/// Difficulty ordering is 0=normal, 1=hard, 2=easy. The ordering is
/// non-intuitive but downstream consumers encode these exact indices, so it
/// must not be "fixed".
pub const GRAVITY_DELAY_TABLE: [[u32; SPEED_LEVELS]; 3] = [
    [1000, 800, 650, 500, 400, 320, 250],  // normal
    [800, 650, 500, 400, 320, 250, 200],   // hard
    [1200, 1000, 800, 600, 500, 400, 320], // easy
];

/// Identifies one of the two players in a versus round
pub type PlayerId = u8;

/// Per-cell render color, decoupled from the semantic cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
}

/// Game difficulty. The numeric encoding (0=normal, 1=hard, 2=easy) is part
/// of the external configuration contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Normal,
    Hard,
    Easy,
}

impl Difficulty {
    /// Map a raw configuration value onto a difficulty, clamping to [0, 2].
    pub fn from_index(value: i32) -> Self {
        match value.clamp(0, 2) {
            0 => Difficulty::Normal,
            1 => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }

    /// Row index into [`GRAVITY_DELAY_TABLE`]
    pub fn index(&self) -> usize {
        match self {
            Difficulty::Normal => 0,
            Difficulty::Hard => 1,
            Difficulty::Easy => 2,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Normal
    }
}

/// Player intent, captured by any input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Left,
    Right,
    Rotate,
    SoftDrop,
    HardDrop,
    Pause,
    Reset,
}

impl Command {
    /// Parse command from its wire string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LEFT" => Some(Command::Left),
            "RIGHT" => Some(Command::Right),
            "ROTATE" => Some(Command::Rotate),
            "SOFT_DROP" => Some(Command::SoftDrop),
            "HARD_DROP" => Some(Command::HardDrop),
            "PAUSE" => Some(Command::Pause),
            "RESET" => Some(Command::Reset),
            _ => None,
        }
    }

    /// Wire string for this command
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Left => "LEFT",
            Command::Right => "RIGHT",
            Command::Rotate => "ROTATE",
            Command::SoftDrop => "SOFT_DROP",
            Command::HardDrop => "HARD_DROP",
            Command::Pause => "PAUSE",
            Command::Reset => "RESET",
        }
    }
}

/// Plain configuration threaded into the core at construction time.
///
/// The core never reads settings from storage or process-wide state; whatever
/// owns startup passes these values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub seed: u32,
    pub difficulty: Difficulty,
    /// Selects palette index 1 (colorblind-safe) instead of 0.
    pub colorblind: bool,
    pub start_level: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            difficulty: Difficulty::Normal,
            colorblind: false,
            start_level: 0,
        }
    }
}

/// Milliseconds since the Unix epoch; used as command capture timestamps and
/// network message creation times.
pub fn epoch_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
