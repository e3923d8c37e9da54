//! Peer wire messages
//!
//! Every message carries a process-unique id and a send timestamp; the
//! payload kind is tagged so peers can route without sniffing fields.
//! Heartbeats are empty on purpose, the timestamp alone feeds the latency
//! monitor.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::attack::PendingAttack;
use crate::types::{epoch_ms, PlayerId};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_message_id() -> String {
    format!("msg-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Session control verbs exchanged outside of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlDirective {
    Start,
    Pause,
    Resume,
    End,
    Ready,
    ReadyCancel,
    StartRequest,
    ModeSelect,
    ModeChanged,
    VersionCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Payload {
    /// An encoded game event that passed the relevance filter
    Event { sender: PlayerId, data: Vec<u8> },
    Control {
        directive: ControlDirective,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        player: Option<PlayerId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        info: Option<String>,
    },
    Attack { attack: PendingAttack },
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetMessage {
    pub id: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub payload: Payload,
}

impl NetMessage {
    fn wrap(payload: Payload) -> Self {
        Self {
            id: next_message_id(),
            timestamp: epoch_ms(),
            payload,
        }
    }

    pub fn event(sender: PlayerId, data: Vec<u8>) -> Self {
        Self::wrap(Payload::Event { sender, data })
    }

    pub fn control(directive: ControlDirective) -> Self {
        Self::control_with(directive, None, None, None)
    }

    /// Control message carrying the optional negotiation fields; absent
    /// fields are omitted from the wire form entirely.
    pub fn control_with(
        directive: ControlDirective,
        mode: Option<String>,
        player: Option<PlayerId>,
        info: Option<String>,
    ) -> Self {
        Self::wrap(Payload::Control {
            directive,
            mode,
            player,
            info,
        })
    }

    pub fn attack(attack: PendingAttack) -> Self {
        Self::wrap(Payload::Attack { attack })
    }

    pub fn heartbeat() -> Self {
        Self::wrap(Payload::Heartbeat)
    }

    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec(self).context("encoding net message")
    }

    pub fn decode(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).context("decoding net message")
    }

    /// Encoded size, used by the bandwidth model
    pub fn size_bytes(&self) -> usize {
        self.encode().map(|b| b.len()).unwrap_or(0)
    }
}
