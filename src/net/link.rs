//! Emulated one-way peer link
//!
//! A sender half pushes messages through a shared [`NetworkEmulator`]; each
//! message crosses on its own thread so a slow or lossy link never blocks
//! the game thread. Survivors land in the receiver's inbox channel.
//! Per-message threads mean heavy jitter can reorder delivery, which is the
//! point of emulating a real link.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use log::{debug, trace};

use crate::net::emulator::NetworkEmulator;
use crate::net::message::NetMessage;

/// Cloning a link yields another sender half feeding the same inbox.
#[derive(Clone)]
pub struct EmulatedLink {
    emulator: Arc<NetworkEmulator>,
    tx: Sender<NetMessage>,
}

impl EmulatedLink {
    /// Build a link and the inbox its survivors arrive on.
    pub fn new(emulator: Arc<NetworkEmulator>) -> (Self, Receiver<NetMessage>) {
        let (tx, rx) = mpsc::channel();
        (Self { emulator, tx }, rx)
    }

    /// Fire a message into the link; returns immediately.
    pub fn send(&self, msg: NetMessage) {
        let emulator = Arc::clone(&self.emulator);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let size = msg.size_bytes();
            if emulator.transmit(size) {
                trace!("delivering {} ({} bytes)", msg.id, size);
                if tx.send(msg).is_err() {
                    debug!("receiver gone, message discarded");
                }
            }
        });
    }

    pub fn stats(&self) -> crate::net::emulator::NetStats {
        self.emulator.stats()
    }
}
