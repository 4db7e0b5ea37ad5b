use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action_id: String,
    pub target_id: Option<String>,
    pub tick: u64,
    /// Whether the choice moved any of the agent's goals meaningfully.
    pub impactful: bool,
}

/// Bounded window of an agent's recent choices, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionHistory {
    window: usize,
    entries: VecDeque<HistoryEntry>,
}

impl ActionHistory {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            entries: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.window {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Occurrences of the same action aimed at the same target.
    pub fn count(&self, action_id: &str, target_id: Option<&str>) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.action_id == action_id && entry.target_id.as_deref() == target_id)
            .count()
    }

    /// Length of the trailing run of non-impactful choices.
    pub fn idle_streak(&self) -> usize {
        self.entries
            .iter()
            .rev()
            .take_while(|entry| !entry.impactful)
            .count()
    }
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(12)
    }
}
