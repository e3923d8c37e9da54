//! Deterministic falling-block versus core with emulated peer-to-peer sync
//!
//! The crate splits into a pure simulation core ([`core`]), the input and
//! event plumbing around it ([`command`], [`events`], [`game_loop`]), and an
//! emulated network layer ([`net`]) for exercising two peers under
//! configurable link conditions.

pub mod command;
pub mod core;
pub mod events;
pub mod game_loop;
pub mod net;
pub mod types;

pub use crate::command::{CommandQueue, TimedCommand, WIRE_VERSION};
pub use crate::core::{
    AttackQueue, Board, GamePhase, GameSnapshot, PendingAttack, Piece, PieceBag, PieceKind,
    PlayerEngine, ShapeGrid, SimpleRng, SnapshotBuilder,
};
pub use crate::events::{is_network_relevant, EventBus, EventKind, GameEvent, LoopTransition};
pub use crate::game_loop::LocalGameLoop;
pub use crate::net::{
    ControlDirective, EmulatedLink, LatencyMonitor, NetConfig, NetMessage, NetworkEmulator,
};
pub use crate::types::{Command, Difficulty, GameConfig, PlayerId, Rgb};
