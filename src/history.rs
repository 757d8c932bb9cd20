use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub term: String,
    pub result_count: usize,
    pub at: DateTime<Utc>,
}

/// Receives one notification per executed search.
pub trait SearchLog: Send {
    fn record(&mut self, term: &str, result_count: usize);
}

/// Bounded record of recent searches. The oldest entry is evicted once
/// `capacity` is reached.
#[derive(Debug, Clone)]
pub struct SearchHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for SearchHistory {
    fn default() -> Self {
        SearchHistory::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl SearchHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        SearchHistory {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Reads entries saved by [`SearchHistory::save`]. A missing file is an
    /// empty history.
    pub fn load(path: &Path, capacity: usize) -> Result<Self> {
        let mut history = SearchHistory::with_capacity(capacity);
        if !path.exists() {
            return Ok(history);
        }
        let entries: Vec<HistoryEntry> = serde_json::from_slice(&fs::read(path)?)?;
        for entry in entries {
            history.push(entry);
        }
        Ok(history)
    }

    /// Writes the entries oldest first.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_vec_pretty(&self.entries)?)?;
        Ok(())
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. The capacity is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 || entry.term.trim().is_empty() {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }
}

impl SearchLog for SearchHistory {
    fn record(&mut self, term: &str, result_count: usize) {
        self.push(HistoryEntry {
            term: term.trim().to_string(),
            result_count,
            at: Utc::now(),
        });
    }
}
