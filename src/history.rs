//! Bounded conversation history.

use std::collections::VecDeque;

use chat_api::Turn;

/// Turns kept in memory per session.
pub const DEFAULT_STORE_LIMIT: usize = 12;
/// Trailing turns sent with each request.
pub const DEFAULT_PAYLOAD_LIMIT: usize = 6;

/// Ordered record of prior turns, oldest first.
///
/// The buffer never holds more than `store_limit` turns; appending past the
/// limit evicts from the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBuffer {
    turns: VecDeque<Turn>,
    store_limit: usize,
    payload_limit: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_LIMIT, DEFAULT_PAYLOAD_LIMIT)
    }
}

impl HistoryBuffer {
    /// Limits are clamped so that `1 <= payload_limit <= store_limit`.
    pub fn new(store_limit: usize, payload_limit: usize) -> Self {
        let store_limit = store_limit.max(1);
        let payload_limit = payload_limit.clamp(1, store_limit);
        Self {
            turns: VecDeque::with_capacity(store_limit),
            store_limit,
            payload_limit,
        }
    }

    pub fn store_limit(&self) -> usize {
        self.store_limit
    }

    pub fn payload_limit(&self) -> usize {
        self.payload_limit
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.store_limit {
            self.turns.pop_front();
        }
    }

    /// The trailing window sent with the next request.
    pub fn truncated_for_request(&self) -> Vec<Turn> {
        let skip = self.turns.len().saturating_sub(self.payload_limit);
        self.turns.iter().skip(skip).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }
}
