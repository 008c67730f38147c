//! One user's conversation: task list, log, confirmation gate, and the
//! turn controller that ties them together.

use std::path::Path;
use std::sync::Arc;

use taskmate_config::{AssistantConfig, Vocabulary};
use taskmate_core::error::{Result, TaskStoreError};
use taskmate_storage::{FileLayout, SessionFiles};
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::confirmation::{ConfirmationGate, OperationId, PendingOperation, Resolution};
use crate::conversation_log::ConversationLog;
use crate::intent::Intent;
use crate::replies;
use crate::task_store::TaskStore;

/// What the transport should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub text: String,
    /// The user asked to end the session.
    pub farewell: bool,
}

impl TurnReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            farewell: false,
        }
    }

    fn farewell(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            farewell: true,
        }
    }
}

pub struct Session {
    name: String,
    files: SessionFiles,
    tasks: TaskStore,
    log: ConversationLog,
    gate: ConfirmationGate,
    classifier: Arc<Classifier>,
    vocabulary: Vocabulary,
}

impl Session {
    /// Open the session for `name`, restoring whatever its files hold.
    pub fn load(
        name: &str,
        layout: &FileLayout,
        classifier: Arc<Classifier>,
        config: &AssistantConfig,
    ) -> Result<Self> {
        let files = layout.for_identity(name);
        let tasks = TaskStore::load(files.tasks.clone(), files.deleted_tasks.clone())?;
        let log = ConversationLog::load(
            files.conversation.clone(),
            files.archive.clone(),
            &config.persona,
        )?;
        let gate = ConfirmationGate::restore(load_pending(&files.pending));

        info!(
            identity = name,
            tasks = tasks.len(),
            turns = log.len(),
            awaiting_confirmation = gate.is_awaiting(),
            "Session loaded"
        );

        Ok(Self {
            name: name.to_string(),
            files,
            tasks,
            log,
            gate,
            classifier,
            vocabulary: config.vocabulary.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.log
    }

    pub fn confirmation(&self) -> &ConfirmationGate {
        &self.gate
    }

    /// Persist tasks, conversation and the armed confirmation.
    pub fn save(&self) -> Result<()> {
        self.tasks.persist()?;
        self.log.persist()?;
        taskmate_storage::save(&self.files.pending, &self.gate.pending())?;
        debug!(identity = %self.name, "Session saved");
        Ok(())
    }

    /// Handle one user message.
    ///
    /// An armed confirmation takes the message before anything else. Then
    /// the exit and debug tokens, then classification and dispatch.
    pub async fn process_turn(&mut self, input: &str) -> Result<TurnReply> {
        let text = input.trim();

        if self.gate.is_awaiting() {
            return self.resolve_confirmation(text);
        }

        if text.to_lowercase() == self.vocabulary.exit.to_lowercase() {
            self.save()?;
            info!(identity = %self.name, "Session ended by user");
            return Ok(TurnReply::farewell(replies::FAREWELL));
        }

        if text == self.vocabulary.debug {
            let dump = self.log.to_pretty_json();
            debug!(identity = %self.name, conversation = %dump, "Conversation dump requested");
            return Ok(TurnReply::text(dump));
        }

        let label = match self.classifier.classify_intent(text).await {
            Ok(label) if !label.is_empty() => label,
            Ok(_) => {
                warn!(identity = %self.name, "Classifier returned an empty answer");
                return Ok(TurnReply::text(replies::CLASSIFIER_UNAVAILABLE));
            }
            Err(e) => {
                warn!(identity = %self.name, error = %e, "Intent classification failed");
                return Ok(TurnReply::text(replies::CLASSIFIER_UNAVAILABLE));
            }
        };

        let response = match Intent::from_label(&label, &self.vocabulary) {
            Intent::Unrecognized(reply) => reply,
            intent => {
                debug!(identity = %self.name, intent = ?intent, "Dispatching");
                self.dispatch(intent, text).await?
            }
        };

        self.log.append_exchange(text, &response);
        Ok(TurnReply::text(response))
    }

    async fn dispatch(&mut self, intent: Intent, text: &str) -> Result<String> {
        match intent {
            Intent::Save => self.handle_save(text).await,
            Intent::ShowTasks => Ok(self.tasks.list_formatted()),
            Intent::DeleteTask => Ok(self.handle_delete_task(text).await),
            Intent::DeleteAllTasks => {
                self.gate.arm(PendingOperation::clear_tasks());
                Ok(replies::confirm_delete_all(&self.vocabulary))
            }
            Intent::Reset => {
                self.gate.arm(PendingOperation::full_reset());
                Ok(replies::confirm_reset(&self.vocabulary))
            }
            Intent::Unrecognized(reply) => Ok(reply),
        }
    }

    async fn handle_save(&mut self, text: &str) -> Result<String> {
        let today = chrono::Local::now().date_naive();
        let records = match self.classifier.extract_tasks(text, today).await {
            Ok(records) => records,
            Err(e) => {
                warn!(identity = %self.name, error = %e, "Could not extract tasks");
                return Ok(replies::SAVE_FAILED.into());
            }
        };

        match self.tasks.append_many(records) {
            Ok(count) => Ok(replies::saved(count)),
            Err(TaskStoreError::MissingDescription { position }) => {
                warn!(identity = %self.name, position, "Extracted task has no description");
                Ok(replies::SAVE_FAILED.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn handle_delete_task(&mut self, text: &str) -> String {
        match self.classifier.extract_delete_target(text, self.tasks.tasks()).await {
            Some(target) => {
                // Name the record that "yes" will actually remove.
                let description = usize::try_from(target.index)
                    .ok()
                    .and_then(|position| position.checked_sub(1))
                    .and_then(|i| self.tasks.tasks().get(i))
                    .map(|task| task.description.clone())
                    .unwrap_or(target.description);
                let question =
                    replies::confirm_delete(&description, target.index, &self.vocabulary);
                self.gate
                    .arm(PendingOperation::delete_task(target.index, &description));
                question
            }
            None => replies::DELETE_NOT_UNDERSTOOD.into(),
        }
    }

    fn resolve_confirmation(&mut self, text: &str) -> Result<TurnReply> {
        let resolution =
            self.gate
                .resolve(text, &self.vocabulary.affirmative, &self.vocabulary.negative);

        match resolution {
            Resolution::Unclear => Ok(TurnReply::text(replies::answer_yes_or_no(&self.vocabulary))),
            Resolution::Cancelled => {
                info!(identity = %self.name, "Pending operation cancelled");
                self.log.append_exchange(text, replies::CANCELLED);
                Ok(TurnReply::text(replies::CANCELLED))
            }
            Resolution::Confirmed(pending) => {
                let operation = pending.operation;
                let response = self.execute(pending)?;
                // A reset starts a fresh log; the confirming exchange is not part of it.
                if operation != OperationId::FullReset {
                    self.log.append_exchange(text, &response);
                }
                Ok(TurnReply::text(response))
            }
        }
    }

    fn execute(&mut self, pending: PendingOperation) -> Result<String> {
        info!(identity = %self.name, operation = ?pending.operation, "Running confirmed operation");
        match pending.operation {
            OperationId::DeleteTask => {
                let Some((position, _)) = pending.delete_task_args() else {
                    warn!(identity = %self.name, args = ?pending.args, "Malformed delete arguments");
                    return Ok(replies::OPERATION_FAILED.into());
                };
                let Ok(position) = usize::try_from(position) else {
                    debug!(position, "Delete position out of range");
                    return Ok(replies::INVALID_INDEX.into());
                };
                match self.tasks.remove_at(position) {
                    Ok(removed) => Ok(replies::deleted(&removed.description)),
                    Err(TaskStoreError::InvalidIndex { position, len }) => {
                        debug!(position, len, "Delete position out of range");
                        Ok(replies::INVALID_INDEX.into())
                    }
                    Err(e) => Err(e.into()),
                }
            }
            OperationId::ClearTasks => Ok(self.tasks.clear_all()?.to_string()),
            OperationId::FullReset => {
                self.log.archive_and_clear()?;
                self.tasks.clear_all()?;
                Ok(replies::welcome(&self.name, &self.vocabulary))
            }
        }
    }
}

/// Read a persisted confirmation. A missing or unreadable file means none.
fn load_pending(path: &Path) -> Option<PendingOperation> {
    if !path.exists() {
        return None;
    }
    match taskmate_storage::load::<Option<PendingOperation>>(path) {
        Ok(pending) => pending,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable pending confirmation");
            None
        }
    }
}
