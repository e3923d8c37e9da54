//! Versus attack queue
//!
//! Incoming garbage is buffered here until the defender's next lock, when it
//! resolves oldest-first. The preview surface walks the other way so the UI
//! shows the most recent threat on top.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::PlayerId;

/// Garbage owed to a player. `pattern` holds one row per attack line,
/// zero cells marking the holes the defender can still exploit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAttack {
    pub lines: u8,
    pub pattern: Vec<Vec<u8>>,
    /// Column the attacker's locking piece was anchored at. Patterns
    /// narrower than the board are merged starting at this column.
    pub offset: i16,
    pub sender: PlayerId,
    pub timestamp: i64,
}

#[derive(Debug, Default)]
pub struct AttackQueue {
    queue: VecDeque<PendingAttack>,
}

impl AttackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an attack. The pattern is cloned so later mutation of the
    /// sender's copy cannot change what lands here.
    pub fn push(&mut self, attack: &PendingAttack) {
        self.queue.push_back(attack.clone());
    }

    /// Drain everything owed, oldest attack first
    pub fn drain(&mut self) -> Vec<PendingAttack> {
        self.queue.drain(..).collect()
    }

    /// Pending attacks newest-first, for display
    pub fn preview(&self) -> Vec<&PendingAttack> {
        self.queue.iter().rev().collect()
    }

    /// Total garbage lines currently owed
    pub fn total_lines(&self) -> u32 {
        self.queue.iter().map(|a| a.lines as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attack(lines: u8, ts: i64) -> PendingAttack {
        PendingAttack {
            lines,
            pattern: vec![vec![1; 10]; lines as usize],
            offset: 3,
            sender: 1,
            timestamp: ts,
        }
    }

    #[test]
    fn test_resolution_is_fifo() {
        let mut q = AttackQueue::new();
        q.push(&attack(1, 10));
        q.push(&attack(2, 20));
        q.push(&attack(3, 30));
        let drained = q.drain();
        assert_eq!(
            drained.iter().map(|a| a.timestamp).collect::<Vec<_>>(),
            vec![10, 20, 30]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn test_preview_is_newest_first() {
        let mut q = AttackQueue::new();
        q.push(&attack(1, 10));
        q.push(&attack(2, 20));
        let preview = q.preview();
        assert_eq!(preview[0].timestamp, 20);
        assert_eq!(preview[1].timestamp, 10);
        // previewing does not consume
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_pattern_is_deep_copied() {
        let mut q = AttackQueue::new();
        let mut original = attack(1, 10);
        q.push(&original);
        original.pattern[0][0] = 0;
        assert_eq!(q.drain()[0].pattern[0][0], 1);
    }

    #[test]
    fn test_total_lines_sums_queue() {
        let mut q = AttackQueue::new();
        q.push(&attack(2, 1));
        q.push(&attack(3, 2));
        assert_eq!(q.total_lines(), 5);
    }
}
