//! User-facing reply texts.

use taskmate_config::Vocabulary;

pub const NO_TASKS: &str = "No tasks right now.";
pub const SAVE_FAILED: &str = "I couldn't understand the task. Please try rephrasing it.";
pub const DELETE_NOT_UNDERSTOOD: &str = "I couldn't understand which task to delete.";
pub const INVALID_INDEX: &str = "Invalid task number.";
pub const TASKS_CLEARED: &str = "All tasks were deleted.";
pub const CANCELLED: &str = "The action was cancelled. How else can I help?";
pub const OPERATION_FAILED: &str = "I couldn't carry out that action.";
pub const FAREWELL: &str = "Goodbye! Your tasks and conversation were saved.";
pub const CLASSIFIER_UNAVAILABLE: &str =
    "I'm having trouble understanding right now. Please try again in a moment.";

pub fn saved(count: usize) -> String {
    if count == 1 {
        "1 task saved successfully. How else can I help?".into()
    } else {
        format!("{count} tasks saved successfully. How else can I help?")
    }
}

pub fn deleted(description: &str) -> String {
    format!("The task '{description}' was removed from the list.")
}

pub fn confirm_delete(description: &str, position: i64, vocabulary: &Vocabulary) -> String {
    format!(
        "Delete the task \"{description}\" (#{position})? [{}/{}]",
        vocabulary.affirmative, vocabulary.negative
    )
}

pub fn confirm_delete_all(vocabulary: &Vocabulary) -> String {
    format!(
        "Delete all the tasks? [{}/{}]",
        vocabulary.affirmative, vocabulary.negative
    )
}

pub fn confirm_reset(vocabulary: &Vocabulary) -> String {
    format!(
        "Reset everything? All tasks and the conversation will be deleted. [{}/{}]",
        vocabulary.affirmative, vocabulary.negative
    )
}

pub fn answer_yes_or_no(vocabulary: &Vocabulary) -> String {
    format!(
        "Please answer '{}' or '{}'.",
        vocabulary.affirmative, vocabulary.negative
    )
}

/// Greeting after a full reset, naming the session identity.
pub fn welcome(name: &str, vocabulary: &Vocabulary) -> String {
    format!(
        "Started a new conversation with {name}'s assistant. \
         Say '{}' to start over or '{}' to quit.",
        vocabulary.reset, vocabulary.exit
    )
}
