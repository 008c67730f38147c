//! JSON and JSON-lines file helpers.
//!
//! Every function creates missing parent directories. Non-ASCII text is
//! written as-is (serde_json never escapes it).

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::Path;
use taskmate_core::error::StorageError;
use tracing::debug;

fn create_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::Write {
            path: parent.to_path_buf(),
            reason: format!("Failed to create directory: {e}"),
        })?;
    }
    Ok(())
}

/// Create the file holding an empty JSON array if it does not exist yet.
pub fn ensure_exists(path: &Path) -> Result<(), StorageError> {
    if path.exists() {
        return Ok(());
    }
    debug!(path = %path.display(), "Creating empty JSON file");
    save(path, &Vec::<serde_json::Value>::new())
}

/// Overwrite the file with pretty-printed JSON.
pub fn save<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StorageError> {
    create_parent(path)?;
    let content = serde_json::to_string_pretty(data).map_err(|e| StorageError::Write {
        path: path.to_path_buf(),
        reason: format!("Failed to serialize: {e}"),
    })?;
    std::fs::write(path, content).map_err(|e| StorageError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Read and deserialize a whole JSON file.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let content = std::fs::read_to_string(path).map_err(|e| StorageError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| StorageError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Append one compact JSON object as a new line.
pub fn append_line<T: Serialize + ?Sized>(path: &Path, entry: &T) -> Result<(), StorageError> {
    create_parent(path)?;
    let line = serde_json::to_string(entry).map_err(|e| StorageError::Write {
        path: path.to_path_buf(),
        reason: format!("Failed to serialize: {e}"),
    })?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StorageError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    writeln!(file, "{line}").map_err(|e| StorageError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn ensure_exists_creates_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("todo_list_a.json");

        ensure_exists(&path).unwrap();
        let data: Vec<Value> = load(&path).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn ensure_exists_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo_list_a.json");
        save(&path, &json!([{"description": "keep me", "time": null}])).unwrap();

        ensure_exists(&path).unwrap();
        let data: Vec<Value> = load(&path).unwrap();
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn save_pretty_prints_and_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_log_a.json");
        save(&path, &json!([{"role": "user", "content": "לשלם חשבון"}])).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains('\n'));
        assert!(raw.contains("לשלם חשבון"));
    }

    #[test]
    fn append_line_writes_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deleted_tasks_a.jsonl");

        append_line(&path, &json!({"description": "first"})).unwrap();
        append_line(&path, &json!({"description": "second"})).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["description"], "second");
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = load::<Vec<Value>>(Path::new("/nonexistent/x.json")).unwrap_err();
        assert!(matches!(err, StorageError::Read { .. }));
    }

    #[test]
    fn load_truncated_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo_list_a.json");
        std::fs::write(&path, "[{\"description\": ").unwrap();
        let err = load::<Vec<Value>>(&path).unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }
}
