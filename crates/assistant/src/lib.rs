//! The conversational core of taskmate.
//!
//! Every user message goes through one [`Session`]:
//!
//! 1. **Confirm**: if a sensitive operation is armed, the message can only
//!    answer it (affirmative / negative), nothing else
//! 2. **Reserved tokens**: exit saves and says goodbye, debug dumps the log
//! 3. **Classify**: the [`Classifier`] asks the completion service for an
//!    intent label
//! 4. **Dispatch**: a known label runs its handler; anything else is the
//!    service's own conversational reply
//!
//! Handlers mutate the [`TaskStore`] and [`ConversationLog`], or arm the
//! [`ConfirmationGate`] and return a yes/no question instead.

pub mod classifier;
pub mod confirmation;
pub mod conversation_log;
pub mod extract;
pub mod intent;
pub mod prompts;
pub mod registry;
pub mod replies;
pub mod session;
pub mod task_store;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::{Classifier, clean_response};
pub use confirmation::{ConfirmationGate, OperationId, PendingOperation, Resolution};
pub use conversation_log::{ArchivedConversation, ConversationLog};
pub use extract::{DeleteTarget, ExtractError};
pub use intent::Intent;
pub use registry::SessionRegistry;
pub use session::{Session, TurnReply};
pub use task_store::TaskStore;
