//! RNG module - deterministic piece dealing
//!
//! A seeded LCG drives both piece dealing and the network emulator's loss and
//! jitter rolls, so whole rounds replay from a single seed. Standard pieces
//! come from a shuffled bag (one of each kind per bag); item pieces are dealt
//! at a fixed ratio on top.

use crate::core::piece::PieceKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Generate a random value in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u32() as f64) / ((u32::MAX as f64) + 1.0)
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// Every Nth draw yields an item piece instead of a bag piece.
pub const ITEM_DRAW_RATIO: u32 = 8;

const STANDARD_KINDS: [PieceKind; 7] = [
    PieceKind::I,
    PieceKind::J,
    PieceKind::L,
    PieceKind::O,
    PieceKind::S,
    PieceKind::T,
    PieceKind::Z,
];

const ITEM_KINDS: [PieceKind; 4] = [
    PieceKind::BoxClear,
    PieceKind::OneLineClear,
    PieceKind::ScoreDouble,
    PieceKind::Weight,
];

/// Deterministic piece dealer: shuffled standard bag plus interleaved items.
#[derive(Debug, Clone)]
pub struct PieceBag {
    bag: [PieceKind; 7],
    bag_index: usize,
    draws: u32,
    seed: u32,
    rng: SimpleRng,
}

impl PieceBag {
    /// Create a new bag with the given seed
    pub fn new(seed: u32) -> Self {
        let mut dealer = Self {
            bag: STANDARD_KINDS,
            bag_index: 0,
            draws: 0,
            seed,
            rng: SimpleRng::new(seed),
        };
        dealer.refill();
        dealer
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    fn refill(&mut self) {
        self.bag = STANDARD_KINDS;
        self.rng.shuffle(&mut self.bag);
        self.bag_index = 0;
    }

    /// Deal the next piece kind.
    ///
    /// Item pieces appear once every [`ITEM_DRAW_RATIO`] draws; all other
    /// draws come from the shuffled bag.
    pub fn draw(&mut self) -> PieceKind {
        self.draws = self.draws.wrapping_add(1);
        if self.draws % ITEM_DRAW_RATIO == 0 {
            let idx = self.rng.next_range(ITEM_KINDS.len() as u32) as usize;
            return ITEM_KINDS[idx];
        }

        if self.bag_index >= self.bag.len() {
            self.refill();
        }
        let kind = self.bag[self.bag_index];
        self.bag_index += 1;
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut a = SimpleRng::new(42);
        let mut b = SimpleRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_rng_zero_seed_does_not_stick() {
        let mut rng = SimpleRng::new(0);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn test_next_f64_in_unit_range() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_bag_deals_each_standard_kind_once_before_repeats() {
        let mut bag = PieceBag::new(12345);
        let mut seen = Vec::new();
        // First 7 non-item draws form a complete bag.
        while seen.len() < 7 {
            let kind = bag.draw();
            if !kind.is_item() {
                seen.push(kind);
            }
        }
        seen.sort_by_key(|k| k.cell_value());
        seen.dedup();
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn test_bag_item_ratio() {
        let mut bag = PieceBag::new(99);
        let items = (0..800).filter(|_| bag.draw().is_item()).count();
        assert_eq!(items, 100);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = PieceBag::new(777);
        let mut b = PieceBag::new(777);
        for _ in 0..50 {
            assert_eq!(a.draw(), b.draw());
        }
    }
}
