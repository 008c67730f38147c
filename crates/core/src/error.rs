//! Error types for the taskmate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for session operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Task store errors ---
    #[error("Task store error: {0}")]
    Task(#[from] TaskStoreError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Unauthorized sender: {sender_id} on {channel}")]
    Unauthorized { channel: String, sender_id: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}

/// Failures of the persistence boundary (JSON files on disk).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Malformed JSON in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// A 1-based position outside `1..=len`.
    #[error("Invalid task position {position} (list has {len} tasks)")]
    InvalidIndex { position: usize, len: usize },

    #[error("Task #{position} in the batch has an empty description")]
    MissingDescription { position: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn invalid_index_is_distinct_from_storage_failure() {
        let err = TaskStoreError::InvalidIndex { position: 7, len: 2 };
        assert!(err.to_string().contains('7'));
        assert!(matches!(err, TaskStoreError::InvalidIndex { .. }));

        let io = TaskStoreError::from(StorageError::Write {
            path: PathBuf::from("/tmp/todo_list_a.json"),
            reason: "disk full".into(),
        });
        assert!(io.to_string().contains("disk full"));
    }

    #[test]
    fn storage_error_wraps_into_top_level() {
        let err: Error = StorageError::Read {
            path: PathBuf::from("chat_log_x.json"),
            reason: "permission denied".into(),
        }
        .into();
        assert!(err.to_string().starts_with("Storage error"));
    }
}
