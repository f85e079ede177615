use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Message;

/// Default number of entries kept in the history file.
pub const MAX_HISTORY: usize = 1000;

/// Messages younger than this are sent along with a new prompt.
pub const HISTORY_WINDOW: Duration = Duration::minutes(15);

/// One line of the history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub message: Message,
}

impl HistoryEntry {
    pub fn new(timestamp: DateTime<Utc>, message: Message) -> Self {
        Self { timestamp, message }
    }
}

/// Messages recorded within `window` before `now`, oldest first.
pub fn recent_messages(entries: &[HistoryEntry], now: DateTime<Utc>, window: Duration) -> Vec<Message> {
    entries
        .iter()
        .filter(|entry| now - entry.timestamp <= window)
        .map(|entry| entry.message.clone())
        .collect()
}

/// Drops the oldest entries so that at most `max` remain.
pub fn trim_history(entries: &mut Vec<HistoryEntry>, max: usize) {
    if entries.len() > max {
        entries.drain(..entries.len() - max);
    }
}
