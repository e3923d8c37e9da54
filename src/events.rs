//! In-process event bus and network relevance filtering
//!
//! Engines publish everything that happens; subscribers pick the kinds they
//! care about. The relevance filter decides which events are worth a wire
//! round-trip: anything that changed simulation state goes out, purely local
//! bookkeeping (ticks, loop lifecycle) stays home.

use std::collections::HashMap;
use std::sync::Mutex;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::attack::PendingAttack;
use crate::core::piece::PieceKind;
use crate::types::{Command, PlayerId};

/// Scheduler lifecycle transitions, published once per actual change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopTransition {
    Started,
    Stopped,
    Paused,
    Resumed,
    RateChanged,
    SpeedChanged { delay_ms: u32, level: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    /// Scheduler heartbeat; local only
    Tick { tick: u64 },
    /// Loop lifecycle change; local only
    TimerLifecycle { transition: LoopTransition },
    PieceSpawned { player: PlayerId, kind: PieceKind },
    /// A command was applied and moved or rotated the piece
    PieceMoved { player: PlayerId, command: Command },
    PieceLocked { player: PlayerId, kind: PieceKind },
    LinesCleared { player: PlayerId, rows: Vec<i16> },
    AllClear { player: PlayerId },
    ScoreChanged { player: PlayerId, score: u32 },
    LevelUp { player: PlayerId, level: u32 },
    ItemActivated { player: PlayerId, kind: PieceKind },
    AttackSent { attack: PendingAttack },
    AttackReceived { player: PlayerId, lines: u8 },
    GameOver { player: PlayerId },
}

/// Subscription key; one per [`GameEvent`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Tick,
    TimerLifecycle,
    PieceSpawned,
    PieceMoved,
    PieceLocked,
    LinesCleared,
    AllClear,
    ScoreChanged,
    LevelUp,
    ItemActivated,
    AttackSent,
    AttackReceived,
    GameOver,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::Tick { .. } => EventKind::Tick,
            GameEvent::TimerLifecycle { .. } => EventKind::TimerLifecycle,
            GameEvent::PieceSpawned { .. } => EventKind::PieceSpawned,
            GameEvent::PieceMoved { .. } => EventKind::PieceMoved,
            GameEvent::PieceLocked { .. } => EventKind::PieceLocked,
            GameEvent::LinesCleared { .. } => EventKind::LinesCleared,
            GameEvent::AllClear { .. } => EventKind::AllClear,
            GameEvent::ScoreChanged { .. } => EventKind::ScoreChanged,
            GameEvent::LevelUp { .. } => EventKind::LevelUp,
            GameEvent::ItemActivated { .. } => EventKind::ItemActivated,
            GameEvent::AttackSent { .. } => EventKind::AttackSent,
            GameEvent::AttackReceived { .. } => EventKind::AttackReceived,
            GameEvent::GameOver { .. } => EventKind::GameOver,
        }
    }
}

/// True for events a peer needs to mirror this player's state.
///
/// Ticks fire at the heartbeat rate and lifecycle transitions are a local
/// scheduler concern; everything else changed the simulation.
pub fn is_network_relevant(event: &GameEvent) -> bool {
    !matches!(
        event,
        GameEvent::Tick { .. } | GameEvent::TimerLifecycle { .. }
    )
}

pub fn encode_event(event: &GameEvent) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(event)?)
}

/// Decode a wire event. Unknown or malformed payloads are logged and
/// dropped so one bad peer message cannot wedge the receive loop.
pub fn decode_event(bytes: &[u8]) -> Option<GameEvent> {
    match serde_json::from_slice(bytes) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!("dropping undecodable event: {}", err);
            None
        }
    }
}

type Handler = Box<dyn Fn(&GameEvent) + Send>;

/// Synchronous pub/sub keyed by event kind.
///
/// Handlers run on the publisher's thread while the registry lock is held,
/// so they must not publish back into the same bus.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<EventKind, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&GameEvent) + Send + 'static,
    {
        let mut handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        handlers.entry(kind).or_default().push(Box::new(handler));
    }

    pub fn publish(&self, event: &GameEvent) {
        let handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = handlers.get(&event.kind()) {
            for handler in list {
                handler(event);
            }
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        handlers.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_publish_reaches_only_matching_subscribers() {
        let bus = EventBus::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let locks = Arc::new(AtomicUsize::new(0));

        let t = Arc::clone(&ticks);
        bus.subscribe(EventKind::Tick, move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        });
        let l = Arc::clone(&locks);
        bus.subscribe(EventKind::PieceLocked, move |_| {
            l.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&GameEvent::Tick { tick: 1 });
        bus.publish(&GameEvent::Tick { tick: 2 });
        bus.publish(&GameEvent::PieceLocked {
            player: 0,
            kind: PieceKind::T,
        });

        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert_eq!(locks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_multiple_subscribers_same_kind() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let c = Arc::clone(&count);
            bus.subscribe(EventKind::GameOver, move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        bus.publish(&GameEvent::GameOver { player: 1 });
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_relevance_filter() {
        assert!(!is_network_relevant(&GameEvent::Tick { tick: 0 }));
        assert!(!is_network_relevant(&GameEvent::TimerLifecycle {
            transition: LoopTransition::Paused,
        }));
        assert!(is_network_relevant(&GameEvent::PieceMoved {
            player: 0,
            command: Command::Left,
        }));
        assert!(is_network_relevant(&GameEvent::LinesCleared {
            player: 0,
            rows: vec![19],
        }));
        assert!(is_network_relevant(&GameEvent::GameOver { player: 0 }));
    }

    #[test]
    fn test_filter_passes_exactly_the_state_changers() {
        // 900 ticks and 100 state-changing events: exactly 100 survive
        let mut stream = Vec::new();
        for i in 0..900u64 {
            stream.push(GameEvent::Tick { tick: i });
        }
        for i in 0..100u32 {
            stream.push(GameEvent::ScoreChanged {
                player: 0,
                score: i,
            });
        }
        let passed = stream.iter().filter(|e| is_network_relevant(e)).count();
        assert_eq!(passed, 100);
    }

    #[test]
    fn test_event_round_trip() {
        let event = GameEvent::LinesCleared {
            player: 1,
            rows: vec![17, 19],
        };
        let bytes = encode_event(&event).unwrap();
        assert_eq!(decode_event(&bytes), Some(event));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_event(b"not json"), None);
        assert_eq!(decode_event(br#"{"type":"NO_SUCH_EVENT"}"#), None);
    }
}
