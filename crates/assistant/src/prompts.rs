//! System instructions sent to the completion service.

use chrono::NaiveDate;
use taskmate_config::Vocabulary;

/// Instruction for intent classification. Known intents come back as the
/// bare label; anything else comes back as a direct reply to the user.
pub fn intent(vocabulary: &Vocabulary) -> String {
    format!(
        "You receive a message from the user of a personal to-do assistant. Decide what the user wants.\n\
         If the message asks to store one or more tasks or reminders, answer exactly: {save}\n\
         If it asks to delete one specific task, answer exactly: {delete_task}\n\
         If it asks to reset everything (tasks and conversation), answer exactly: {reset}\n\
         If it asks to see the task list, answer exactly: {show_tasks}\n\
         If it asks to delete all the tasks, answer exactly: {delete_all_tasks}\n\
         Answer with the label alone, without quotes or punctuation.\n\
         Otherwise do not answer with a label: reply to the user directly, briefly and kindly, in the user's language.",
        save = vocabulary.save,
        delete_task = vocabulary.delete_task,
        reset = vocabulary.reset,
        show_tasks = vocabulary.show_tasks,
        delete_all_tasks = vocabulary.delete_all_tasks,
    )
}

/// Instruction for task extraction relative to `today`.
pub fn extract_tasks(today: NaiveDate) -> String {
    format!(
        "Today is {today}. Extract every task from the user's message.\n\
         Return only a JSON array. Each element is an object with exactly two keys: \
         \"description\" (short text) and \"time\" (date and time as \"YYYY-MM-DD HH:MM\" resolved \
         relative to today, or null when the message gives no time).\n\
         Do not add explanations or code fences."
    )
}

/// Stricter fallback used once after an unparseable extraction.
pub fn extract_tasks_strict(today: NaiveDate) -> String {
    format!(
        "Today is {today}. Return ONLY valid JSON, nothing else. Example: \
         [{{\"description\": \"pay the bill\", \"time\": \"2025-04-03 18:00\"}}]"
    )
}

/// Instruction for picking the task to delete out of `task_list`, a JSON
/// array whose elements carry their 1-based `index`.
pub fn delete_target(task_list: &str) -> String {
    format!(
        "The user wants to delete one task from this list (positions start at 1):\n\
         {task_list}\n\
         Return only a JSON object {{\"index\": <position>, \"description\": \"<task description>\"}} \
         for the task the user means, or null if no task matches."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_prompt_lists_every_label() {
        let vocabulary = Vocabulary::default();
        let prompt = intent(&vocabulary);
        for label in vocabulary.intent_labels() {
            assert!(prompt.contains(label), "missing {label}");
        }
    }

    #[test]
    fn intent_prompt_uses_configured_language() {
        let vocabulary = Vocabulary {
            save: "שמור".into(),
            ..Vocabulary::default()
        };
        assert!(intent(&vocabulary).contains("answer exactly: שמור"));
    }

    #[test]
    fn extraction_prompts_embed_the_date() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 21).unwrap();
        assert!(extract_tasks(today).starts_with("Today is 2025-04-21."));
        let strict = extract_tasks_strict(today);
        assert!(strict.contains("2025-04-21"));
        assert!(strict.contains(r#"[{"description": "pay the bill""#));
    }

    #[test]
    fn delete_prompt_embeds_the_list() {
        let prompt = delete_target(r#"[{"index": 1, "description": "gym"}]"#);
        assert!(prompt.contains(r#""description": "gym""#));
        assert!(prompt.contains("or null"));
    }
}
