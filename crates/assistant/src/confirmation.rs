//! Confirmation gate for destructive operations.
//!
//! A handler that would delete data arms the gate with a
//! [`PendingOperation`] instead of acting. While armed, the next message
//! can only resolve it: affirmative runs the operation, negative drops it,
//! anything else re-prompts and leaves it armed.
//!
//! The pending operation is a plain identifier plus JSON arguments, so it
//! survives a restart when persisted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationId {
    /// Remove one task; args are `[position, description]`.
    DeleteTask,
    /// Remove every task.
    ClearTasks,
    /// Remove every task and archive the conversation.
    FullReset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub operation: OperationId,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl PendingOperation {
    pub fn delete_task(position: i64, description: &str) -> Self {
        Self {
            operation: OperationId::DeleteTask,
            args: vec![Value::from(position), Value::from(description)],
        }
    }

    pub fn clear_tasks() -> Self {
        Self {
            operation: OperationId::ClearTasks,
            args: Vec::new(),
        }
    }

    pub fn full_reset() -> Self {
        Self {
            operation: OperationId::FullReset,
            args: Vec::new(),
        }
    }

    /// Decode `[position, description]`. `None` if the arguments do not
    /// have that shape.
    pub fn delete_task_args(&self) -> Option<(i64, String)> {
        match self.args.as_slice() {
            [position, Value::String(description)] => {
                Some((position.as_i64()?, description.clone()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum ConfirmationState {
    #[default]
    Idle,
    AwaitingConfirmation { pending: PendingOperation },
}

/// Outcome of feeding a reply to an armed gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Affirmative: run this operation. The gate is idle again.
    Confirmed(PendingOperation),
    /// Negative: the operation was dropped. The gate is idle again.
    Cancelled,
    /// Neither token: the gate stays armed.
    Unclear,
}

#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    state: ConfirmationState,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted pending operation.
    pub fn restore(pending: Option<PendingOperation>) -> Self {
        let state = match pending {
            Some(pending) => ConfirmationState::AwaitingConfirmation { pending },
            None => ConfirmationState::Idle,
        };
        Self { state }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, ConfirmationState::AwaitingConfirmation { .. })
    }

    pub fn pending(&self) -> Option<&PendingOperation> {
        match &self.state {
            ConfirmationState::AwaitingConfirmation { pending } => Some(pending),
            ConfirmationState::Idle => None,
        }
    }

    /// Hold `pending` until the next reply. Replaces anything already armed.
    pub fn arm(&mut self, pending: PendingOperation) {
        debug!(operation = ?pending.operation, "Confirmation armed");
        self.state = ConfirmationState::AwaitingConfirmation { pending };
    }

    /// Resolve an armed gate with a reply, compared verbatim after trimming.
    /// An idle gate always yields [`Resolution::Unclear`].
    pub fn resolve(&mut self, reply: &str, affirmative: &str, negative: &str) -> Resolution {
        if !self.is_awaiting() {
            return Resolution::Unclear;
        }
        let reply = reply.trim();
        if reply == affirmative {
            match std::mem::take(&mut self.state) {
                ConfirmationState::AwaitingConfirmation { pending } => Resolution::Confirmed(pending),
                ConfirmationState::Idle => Resolution::Unclear,
            }
        } else if reply == negative {
            self.state = ConfirmationState::Idle;
            Resolution::Cancelled
        } else {
            Resolution::Unclear
        }
    }
}
