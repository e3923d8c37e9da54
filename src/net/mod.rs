//! Emulated peer-to-peer plumbing

pub mod emulator;
pub mod link;
pub mod message;
pub mod monitor;

pub use emulator::{NetConfig, NetStats, NetworkEmulator};
pub use link::EmulatedLink;
pub use message::{ControlDirective, NetMessage, Payload};
pub use monitor::{LatencyMonitor, LATENCY_WINDOW};
