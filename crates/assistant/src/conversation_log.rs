//! Append-only conversation history, seeded with one system turn.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskmate_core::error::StorageError;
use taskmate_core::message::{Message, Role};
use tracing::{debug, info};

#[derive(Debug)]
pub struct ConversationLog {
    turns: Vec<Message>,
    persona: String,
    path: PathBuf,
    archive_path: PathBuf,
}

/// Snapshot written when a conversation is reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedConversation {
    pub timestamp: DateTime<Utc>,
    pub turns: Vec<Message>,
}

impl ConversationLog {
    /// Load the log at `path`. An absent or empty log starts with the
    /// persona as its system turn.
    pub fn load(
        path: PathBuf,
        archive_path: PathBuf,
        persona: impl Into<String>,
    ) -> Result<Self, StorageError> {
        taskmate_storage::ensure_exists(&path)?;
        let turns: Vec<Message> = taskmate_storage::load(&path)?;
        let mut log = Self {
            turns,
            persona: persona.into(),
            path,
            archive_path,
        };
        if log.turns.is_empty() {
            log.seed();
        }
        debug!(path = %log.path.display(), turns = log.turns.len(), "Loaded conversation");
        Ok(log)
    }

    fn seed(&mut self) {
        self.turns = vec![Message::system(&self.persona)];
    }

    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn append_turn(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(Message::new(role, content));
    }

    /// A user message followed by the reply it got.
    pub fn append_exchange(&mut self, user: &str, assistant: &str) {
        self.append_turn(Role::User, user);
        self.append_turn(Role::Assistant, assistant);
    }

    /// Write the current turns to the archive file, then start over with
    /// only the system turn.
    pub fn archive_and_clear(&mut self) -> Result<(), StorageError> {
        let archived = ArchivedConversation {
            timestamp: Utc::now(),
            turns: std::mem::take(&mut self.turns),
        };
        let result = taskmate_storage::save(&self.archive_path, &archived);
        match result {
            Ok(()) => {
                info!(turns = archived.turns.len(), "Conversation archived");
                self.seed();
                Ok(())
            }
            Err(e) => {
                self.turns = archived.turns;
                Err(e)
            }
        }
    }

    pub fn persist(&self) -> Result<(), StorageError> {
        taskmate_storage::save(&self.path, &self.turns)
    }

    /// Pretty JSON of every turn.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.turns).unwrap_or_else(|_| "[]".into())
    }
}
