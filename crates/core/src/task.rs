//! The to-do record.

use serde::{Deserialize, Serialize};

/// One stored task. Records are created by the save flow, destroyed by the
/// delete flows and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// What to do. Never empty once stored.
    pub description: String,

    /// Free-form time as the extractor rendered it, e.g. `2025-04-22 18:00`.
    /// Serialized as `null` when absent so every stored record has both keys.
    #[serde(default)]
    pub time: Option<String>,
}

impl TaskRecord {
    pub fn new(description: impl Into<String>, time: Option<String>) -> Self {
        Self {
            description: description.into(),
            time,
        }
    }

    /// Render as a list line for the given 1-based position.
    pub fn render(&self, position: usize) -> String {
        match self.time.as_deref().filter(|t| !t.is_empty()) {
            Some(time) => format!("{position}. {} ({time})", self.description),
            None => format!("{position}. {}", self.description),
        }
    }
}
