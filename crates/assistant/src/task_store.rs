//! Ordered task list mirrored to a JSON file.
//!
//! Every mutation builds the new list, writes it, and only then replaces
//! the in-memory copy, so a failed write leaves memory and disk agreeing.

use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use taskmate_core::TaskRecord;
use taskmate_core::error::{StorageError, TaskStoreError};
use tracing::{debug, info};

use crate::replies;

#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<TaskRecord>,
    path: PathBuf,
    audit_path: PathBuf,
}

/// One line of the deleted-tasks audit log.
#[derive(Serialize)]
struct DeletedTask<'a> {
    deleted_at: String,
    position: usize,
    #[serde(flatten)]
    task: &'a TaskRecord,
}

impl TaskStore {
    /// Load the list at `path`, creating an empty one if absent.
    pub fn load(path: PathBuf, audit_path: PathBuf) -> Result<Self, StorageError> {
        taskmate_storage::ensure_exists(&path)?;
        let tasks: Vec<TaskRecord> = taskmate_storage::load(&path)?;
        debug!(path = %path.display(), count = tasks.len(), "Loaded task list");
        Ok(Self {
            tasks,
            path,
            audit_path,
        })
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Append records in order and persist. Rejects the whole batch if any
    /// record has an empty description.
    pub fn append_many(&mut self, records: Vec<TaskRecord>) -> Result<usize, TaskStoreError> {
        if let Some(i) = records.iter().position(|r| r.description.trim().is_empty()) {
            return Err(TaskStoreError::MissingDescription { position: i + 1 });
        }

        let count = records.len();
        let mut next = self.tasks.clone();
        next.extend(records);
        self.commit(next)?;
        info!(added = count, total = self.tasks.len(), "Tasks saved");
        Ok(count)
    }

    /// Numbered listing from 1, one task per line.
    pub fn list_formatted(&self) -> String {
        if self.tasks.is_empty() {
            return replies::NO_TASKS.to_string();
        }
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, task)| task.render(i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Remove the task at a 1-based position, recording it in the audit log.
    pub fn remove_at(&mut self, position: usize) -> Result<TaskRecord, TaskStoreError> {
        if position == 0 || position > self.tasks.len() {
            return Err(TaskStoreError::InvalidIndex {
                position,
                len: self.tasks.len(),
            });
        }

        let mut next = self.tasks.clone();
        let removed = next.remove(position - 1);
        taskmate_storage::append_line(
            &self.audit_path,
            &DeletedTask {
                deleted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                position,
                task: &removed,
            },
        )?;
        self.commit(next)?;
        info!(position, remaining = self.tasks.len(), "Task removed");
        Ok(removed)
    }

    /// Remove every task.
    pub fn clear_all(&mut self) -> Result<&'static str, TaskStoreError> {
        let cleared = self.tasks.len();
        self.commit(Vec::new())?;
        info!(cleared, "Task list cleared");
        Ok(replies::TASKS_CLEARED)
    }

    /// Write the current list to disk.
    pub fn persist(&self) -> Result<(), StorageError> {
        taskmate_storage::save(&self.path, &self.tasks)
    }

    fn commit(&mut self, next: Vec<TaskRecord>) -> Result<(), StorageError> {
        taskmate_storage::save(&self.path, &next)?;
        self.tasks = next;
        Ok(())
    }
}
