//! Offline command message ack ledger.
//!
//! The ledger remembers, per uid, the highest command message sequence the
//! backend has confirmed as consumed. It only moves forward; `reset` is the
//! one explicit way back.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Result of an acknowledge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The backend accepted the ack and the cursor moved to this sequence.
    Acknowledged {
        /// New cursor value.
        last_message_seq: u64,
    },
    /// The sequence was at or below the cursor; nothing was sent.
    Stale {
        /// Cursor value, unchanged.
        current: u64,
    },
}

impl AckOutcome {
    /// Returns the cursor value after the call.
    pub fn cursor(&self) -> u64 {
        match self {
            AckOutcome::Acknowledged { last_message_seq } => *last_message_seq,
            AckOutcome::Stale { current } => *current,
        }
    }

    /// Returns true if a request was sent and accepted.
    pub fn was_sent(&self) -> bool {
        matches!(self, AckOutcome::Acknowledged { .. })
    }
}

/// Storage for per-uid offline command cursors.
///
/// Implement this to persist cursors across restarts.
pub trait AckStore: Send + Sync {
    /// Returns the acknowledged cursor for a uid (`0` when unknown).
    fn last_acked(&self, uid: &str) -> u64;

    /// Moves the cursor to `max(current, seq)` and returns the result.
    fn advance(&self, uid: &str, seq: u64) -> u64;

    /// Seeds the cursor from persisted state, replacing any value.
    fn restore(&self, uid: &str, seq: u64);

    /// Forgets the cursor for a uid.
    fn reset(&self, uid: &str);
}

/// An in-memory ack store.
#[derive(Debug, Default)]
pub struct MemoryAckStore {
    cursors: RwLock<HashMap<String, u64>>,
}

impl MemoryAckStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every cursor.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.cursors.read().clone()
    }
}

impl AckStore for MemoryAckStore {
    fn last_acked(&self, uid: &str) -> u64 {
        self.cursors.read().get(uid).copied().unwrap_or(0)
    }

    fn advance(&self, uid: &str, seq: u64) -> u64 {
        let mut cursors = self.cursors.write();
        let cursor = cursors.entry(uid.to_string()).or_insert(0);
        *cursor = (*cursor).max(seq);
        *cursor
    }

    fn restore(&self, uid: &str, seq: u64) {
        self.cursors.write().insert(uid.to_string(), seq);
    }

    fn reset(&self, uid: &str) {
        self.cursors.write().remove(uid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn advance_is_monotone() {
        let store = MemoryAckStore::new();
        assert_eq!(store.last_acked("u1"), 0);

        assert_eq!(store.advance("u1", 50), 50);
        assert_eq!(store.advance("u1", 30), 50);
        assert_eq!(store.last_acked("u1"), 50);
        assert_eq!(store.last_acked("u2"), 0);
    }

    #[test]
    fn restore_and_reset() {
        let store = MemoryAckStore::new();
        store.restore("u1", 12);
        assert_eq!(store.last_acked("u1"), 12);

        store.reset("u1");
        assert_eq!(store.last_acked("u1"), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn concurrent_advances_keep_max() {
        let store = Arc::new(MemoryAckStore::new());
        let handles: Vec<_> = (1..=8u64)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for seq in (0..100).map(|n| n * i) {
                        store.advance("u1", seq);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.last_acked("u1"), 99 * 8);
    }

    #[test]
    fn outcome_cursor() {
        assert_eq!(AckOutcome::Acknowledged { last_message_seq: 5 }.cursor(), 5);
        assert_eq!(AckOutcome::Stale { current: 9 }.cursor(), 9);
        assert!(!AckOutcome::Stale { current: 9 }.was_sent());
    }
}
