use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::agent::output_types::ResponseValue;

/// One completed turn. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub user_query: String,
    pub response: ResponseValue,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(user_query: impl Into<String>, response: ResponseValue) -> Self {
        Self {
            user_query: user_query.into(),
            response,
            timestamp: Utc::now(),
        }
    }
}

/// Bounded, ordered log of turns with FIFO eviction
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl HistoryWindow {
    /// A zero capacity is bumped to one so the latest turn is always retained.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The last `n` entries, oldest first. Returns everything when `n` exceeds the size.
    pub fn recent(&self, n: usize) -> Vec<&HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
