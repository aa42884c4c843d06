//! Audit history of notable player actions

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::info;

use crate::game::PlayerId;

/// Entries kept before the oldest are dropped
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// One audit line
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub actor: PlayerId,
    pub actor_name: String,
    pub description: String,
}

/// Bounded ring buffer of recent entries
pub struct HistoryLog {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, actor: PlayerId, actor_name: &str, description: &str) {
        info!(player_id = %actor, actor = actor_name, "{}", description);

        let entry = HistoryEntry {
            at: Utc::now(),
            actor,
            actor_name: actor_name.to_string(),
            description: description.to_string(),
        };

        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent entries, oldest first
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_drop_first() {
        let log = HistoryLog::new(2);
        log.record(PlayerId(1), "a", "first");
        log.record(PlayerId(2), "b", "second");
        log.record(PlayerId(3), "c", "third");

        let descriptions: Vec<_> = log.recent(10).into_iter().map(|e| e.description).collect();
        assert_eq!(descriptions, vec!["second", "third"]);
    }

    #[test]
    fn recent_limits_to_newest() {
        let log = HistoryLog::default();
        for i in 0..5 {
            log.record(PlayerId(i), "p", &format!("event {i}"));
        }
        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].description, "event 4");
        assert_eq!(recent[0].actor, PlayerId(3));
    }
}
