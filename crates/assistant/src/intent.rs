//! The closed set of intents a message can be dispatched to.

use taskmate_config::Vocabulary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Save,
    DeleteTask,
    Reset,
    ShowTasks,
    DeleteAllTasks,
    /// The classifier answered with something other than a label. The text
    /// is its conversational reply to the user.
    Unrecognized(String),
}

impl Intent {
    /// Map a classifier answer onto an intent. Labels match verbatim.
    pub fn from_label(label: &str, vocabulary: &Vocabulary) -> Self {
        let label = label.trim();
        if label == vocabulary.save {
            Self::Save
        } else if label == vocabulary.delete_task {
            Self::DeleteTask
        } else if label == vocabulary.reset {
            Self::Reset
        } else if label == vocabulary.show_tasks {
            Self::ShowTasks
        } else if label == vocabulary.delete_all_tasks {
            Self::DeleteAllTasks
        } else {
            Self::Unrecognized(label.to_string())
        }
    }
}
