//! Score and level bookkeeping

pub const SINGLE_POINTS: u32 = 100;
pub const MULTI_POINTS_PER_LINE: u32 = 150;
pub const PREMIUM_POINTS_PER_LINE: u32 = 300;
pub const ALL_CLEAR_BONUS: u32 = 1000;
pub const SOFT_DROP_POINTS: u32 = 1;
pub const HARD_DROP_POINTS: u32 = 2;
pub const LINES_PER_LEVEL: u32 = 10;

/// Base points for clearing `lines` rows at once
pub fn line_clear_points(lines: usize) -> u32 {
    match lines {
        0 => 0,
        1 => SINGLE_POINTS,
        2 | 3 => MULTI_POINTS_PER_LINE * lines as u32,
        _ => PREMIUM_POINTS_PER_LINE * lines as u32,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scoring {
    pub score: u32,
    pub lines: u32,
    /// Set when a ScoreDouble item locks; consumed by the next clear
    pub double_next_clear: bool,
}

impl Scoring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Award a line clear, applying a pending ScoreDouble and the all-clear
    /// bonus. Returns the points actually added.
    pub fn award_clear(&mut self, lines: usize, all_clear: bool) -> u32 {
        let mut points = line_clear_points(lines);
        if points > 0 && self.double_next_clear {
            points *= 2;
            self.double_next_clear = false;
        }
        if all_clear {
            points += ALL_CLEAR_BONUS;
        }
        self.score += points;
        self.lines += lines as u32;
        points
    }

    pub fn award_soft_drop(&mut self, cells: u32) {
        self.score += SOFT_DROP_POINTS * cells;
    }

    pub fn award_hard_drop(&mut self, cells: u32) {
        self.score += HARD_DROP_POINTS * cells;
    }

    /// Level derived from total cleared lines
    pub fn level(&self) -> u32 {
        self.lines / LINES_PER_LEVEL
    }
}
