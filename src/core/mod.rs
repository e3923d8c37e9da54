//! Deterministic simulation core

pub mod attack;
pub mod board;
pub mod engine;
pub mod piece;
pub mod rng;
pub mod scoring;
pub mod shape;
pub mod state;

pub use attack::{AttackQueue, PendingAttack};
pub use board::Board;
pub use engine::PlayerEngine;
pub use piece::{Piece, PieceKind};
pub use rng::{PieceBag, SimpleRng};
pub use scoring::Scoring;
pub use shape::ShapeGrid;
pub use state::{GamePhase, GameSnapshot, SnapshotBuilder};
