//! Thread-safe command queue and its wire encoding
//!
//! Input sources (local keys, a peer connection, a replay) push timed
//! commands from any thread; the simulation drains the whole backlog at the
//! start of each tick so commands apply in arrival order within a tick.
//!
//! The wire shape is a versioned envelope so a future protocol change can be
//! detected instead of silently misparsed.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::types::{epoch_ms, Command};

pub const WIRE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedCommand {
    #[serde(rename = "type")]
    pub command: Command,
    pub timestamp: i64,
}

impl TimedCommand {
    pub fn now(command: Command) -> Self {
        Self {
            command,
            timestamp: epoch_ms(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CommandEnvelope {
    version: u32,
    command: TimedCommand,
}

/// Encode one command for the wire
pub fn serialize_command(cmd: &TimedCommand) -> anyhow::Result<String> {
    let envelope = CommandEnvelope {
        version: WIRE_VERSION,
        command: *cmd,
    };
    serde_json::to_string(&envelope).context("encoding command")
}

/// Decode one command, rejecting foreign protocol versions
pub fn parse_command(raw: &str) -> anyhow::Result<TimedCommand> {
    let envelope: CommandEnvelope = serde_json::from_str(raw).context("decoding command")?;
    if envelope.version != WIRE_VERSION {
        bail!(
            "unsupported command version {} (expected {})",
            envelope.version,
            WIRE_VERSION
        );
    }
    Ok(envelope.command)
}

/// Encode a drained backlog as one message; an empty backlog is `[]`.
pub fn serialize_batch(cmds: &[TimedCommand]) -> anyhow::Result<String> {
    let envelopes: Vec<CommandEnvelope> = cmds
        .iter()
        .map(|&command| CommandEnvelope {
            version: WIRE_VERSION,
            command,
        })
        .collect();
    serde_json::to_string(&envelopes).context("encoding command batch")
}

pub fn parse_batch(raw: &str) -> anyhow::Result<Vec<TimedCommand>> {
    let envelopes: Vec<CommandEnvelope> =
        serde_json::from_str(raw).context("decoding command batch")?;
    envelopes
        .into_iter()
        .map(|e| {
            if e.version != WIRE_VERSION {
                bail!(
                    "unsupported command version {} (expected {})",
                    e.version,
                    WIRE_VERSION
                );
            }
            Ok(e.command)
        })
        .collect()
}

/// FIFO command backlog shared between producer threads and the tick loop
#[derive(Default)]
pub struct CommandQueue {
    inner: Mutex<VecDeque<TimedCommand>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, cmd: TimedCommand) {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.push_back(cmd);
    }

    pub fn push_now(&self, command: Command) {
        self.push(TimedCommand::now(command));
    }

    /// Take the whole backlog in arrival order, leaving the queue empty.
    ///
    /// Swaps the buffer out under the lock so producers are blocked only for
    /// the exchange, not for the caller's processing.
    pub fn drain_for_tick(&self) -> VecDeque<TimedCommand> {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *queue)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wire_round_trip() {
        let cmd = TimedCommand {
            command: Command::Rotate,
            timestamp: 123,
        };
        let raw = serialize_command(&cmd).unwrap();
        assert!(raw.contains("\"version\":1"));
        assert!(raw.contains("\"ROTATE\""));
        assert_eq!(parse_command(&raw).unwrap(), cmd);
    }

    #[test]
    fn test_rejects_foreign_version() {
        let raw = r#"{"version":2,"command":{"type":"LEFT","timestamp":0}}"#;
        assert!(parse_command(raw).is_err());
    }

    #[test]
    fn test_rejects_malformed_payload() {
        assert!(parse_command("{").is_err());
        assert!(parse_command(r#"{"version":1,"command":{"type":"WARP","timestamp":0}}"#).is_err());
    }

    #[test]
    fn test_empty_batch_is_empty_array() {
        assert_eq!(serialize_batch(&[]).unwrap(), "[]");
        assert!(parse_batch("[]").unwrap().is_empty());
    }

    #[test]
    fn test_batch_preserves_order() {
        let cmds = vec![
            TimedCommand {
                command: Command::Left,
                timestamp: 1,
            },
            TimedCommand {
                command: Command::Rotate,
                timestamp: 2,
            },
            TimedCommand {
                command: Command::HardDrop,
                timestamp: 3,
            },
        ];
        let raw = serialize_batch(&cmds).unwrap();
        assert_eq!(parse_batch(&raw).unwrap(), cmds);
    }

    #[test]
    fn test_drain_empties_queue_in_order() {
        let q = CommandQueue::new();
        q.push_now(Command::Left);
        q.push_now(Command::Right);
        q.push_now(Command::HardDrop);
        let drained = q.drain_for_tick();
        assert_eq!(
            drained.iter().map(|c| c.command).collect::<Vec<_>>(),
            vec![Command::Left, Command::Right, Command::HardDrop]
        );
        assert!(q.is_empty());
        assert!(q.drain_for_tick().is_empty());
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let q = Arc::new(CommandQueue::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let q = Arc::clone(&q);
            handles.push(thread::spawn(move || {
                for _ in 0..250 {
                    q.push_now(Command::SoftDrop);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(q.drain_for_tick().len(), 1000);
    }
}
