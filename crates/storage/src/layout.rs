//! Per-identity file layout.
//!
//! Each session identity owns five files in the data directory, named by
//! substituting the encoded identity into the configured templates.

use std::fmt::Write;
use std::path::PathBuf;
use taskmate_config::StorageConfig;

/// Data directory plus file-name templates.
#[derive(Debug, Clone)]
pub struct FileLayout {
    data_dir: PathBuf,
    tasks: String,
    conversation: String,
    deleted_tasks: String,
    archive: String,
    pending: String,
}

/// Resolved paths for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFiles {
    /// Live task list (JSON array)
    pub tasks: PathBuf,
    /// Live conversation log (JSON array)
    pub conversation: PathBuf,
    /// Append-only audit of deleted tasks (JSONL)
    pub deleted_tasks: PathBuf,
    /// Snapshot of the last archived conversation (JSON object)
    pub archive: PathBuf,
    /// Armed confirmation, or `null`
    pub pending: PathBuf,
}

impl FileLayout {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            tasks: config.tasks_template.clone(),
            conversation: config.conversation_template.clone(),
            deleted_tasks: config.deleted_tasks_template.clone(),
            archive: config.archive_template.clone(),
            pending: config.pending_template.clone(),
        }
    }

    /// Default templates rooted at a custom directory.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(&StorageConfig {
            data_dir: data_dir.into(),
            ..StorageConfig::default()
        })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Resolve the five file paths for an identity.
    pub fn for_identity(&self, identity: &str) -> SessionFiles {
        let name = encode_identity(identity);
        let path = |template: &str| self.data_dir.join(template.replace("{name}", &name));
        SessionFiles {
            tasks: path(&self.tasks),
            conversation: path(&self.conversation),
            deleted_tasks: path(&self.deleted_tasks),
            archive: path(&self.archive),
            pending: path(&self.pending),
        }
    }
}

/// Encode an identity as a file-name stem.
///
/// ASCII alphanumerics, `-`, `_` and spaces pass through; every other byte
/// becomes `%XX`. `%` is itself escaped, so the mapping is injective and
/// separators or `..` never reach the filesystem. The empty identity
/// encodes as a lone `%`.
pub fn encode_identity(identity: &str) -> String {
    if identity.is_empty() {
        return "%".into();
    }
    let mut encoded = String::with_capacity(identity.len());
    for byte in identity.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b' ') {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_templates() {
        let layout = FileLayout::in_dir("/data");
        let files = layout.for_identity("Ajent 1");
        assert_eq!(files.tasks, PathBuf::from("/data/todo_list_Ajent 1.json"));
        assert_eq!(files.conversation, PathBuf::from("/data/chat_log_Ajent 1.json"));
        assert_eq!(files.deleted_tasks, PathBuf::from("/data/deleted_tasks_Ajent 1.jsonl"));
        assert_eq!(files.archive, PathBuf::from("/data/deleted_messages_Ajent 1.json"));
        assert_eq!(files.pending, PathBuf::from("/data/pending_Ajent 1.json"));
    }

    #[test]
    fn transport_identities_are_encoded() {
        assert_eq!(encode_identity("whatsapp:+15550001"), "whatsapp%3A%2B15550001");
        assert_eq!(encode_identity("../../etc/passwd"), "%2E%2E%2F%2E%2E%2Fetc%2Fpasswd");
        assert_eq!(encode_identity("100%"), "100%25");
        assert_eq!(encode_identity(""), "%");
    }

    #[test]
    fn lookalike_identities_do_not_collide() {
        let layout = FileLayout::in_dir("/data");
        assert_ne!(layout.for_identity("whatsapp:+1"), layout.for_identity("whatsapp_+1"));
        assert_ne!(layout.for_identity("דנה"), layout.for_identity("משה"));
        assert_ne!(layout.for_identity(" bob"), layout.for_identity("bob"));
        assert_ne!(layout.for_identity("a:"), layout.for_identity("a%3A"));
    }

    #[test]
    fn hebrew_identity_stays_inside_data_dir() {
        let files = FileLayout::in_dir("/data").for_identity("דנה");
        assert_eq!(files.tasks, PathBuf::from("/data/todo_list_%D7%93%D7%A0%D7%94.json"));
    }

    #[test]
    fn distinct_identities_get_distinct_files() {
        let layout = FileLayout::in_dir("/data");
        assert_ne!(layout.for_identity("alice"), layout.for_identity("bob"));
    }

    #[test]
    fn custom_templates_are_honored() {
        let layout = FileLayout::new(&StorageConfig {
            data_dir: PathBuf::from("/srv"),
            tasks_template: "{name}/tasks.json".into(),
            ..StorageConfig::default()
        });
        assert_eq!(
            layout.for_identity("bob").tasks,
            PathBuf::from("/srv/bob/tasks.json")
        );
    }
}
