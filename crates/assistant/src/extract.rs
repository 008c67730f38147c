//! Parsing and validation of structured classifier output.

use serde_json::Value;
use taskmate_core::TaskRecord;
use taskmate_core::error::ProviderError;

/// Why a task extraction produced nothing usable.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("completion failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("response is not valid JSON: {0}")]
    Syntax(String),

    #[error("unexpected JSON shape: {0}")]
    Shape(String),

    #[error("no tasks in response")]
    Empty,
}

impl ExtractError {
    /// Transport and syntax failures are worth one retry with the strict
    /// prompt. A well-formed answer with the wrong shape is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Syntax(_))
    }
}

/// The task a delete request refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    /// 1-based list position as the model gave it, possibly out of range
    pub index: i64,
    pub description: String,
}

/// Parse an extraction response into task records.
///
/// A single object is accepted as a one-element list. Every element must
/// carry both `description` and `time`; `time` may be `null`.
pub fn parse_tasks(cleaned: &str) -> Result<Vec<TaskRecord>, ExtractError> {
    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| ExtractError::Syntax(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(ExtractError::Shape(format!(
                "expected an array or object, got {other}"
            )));
        }
    };

    if items.is_empty() {
        return Err(ExtractError::Empty);
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_task(i + 1, item))
        .collect()
}

fn parse_task(position: usize, item: &Value) -> Result<TaskRecord, ExtractError> {
    let Some(object) = item.as_object() else {
        return Err(ExtractError::Shape(format!("element {position} is not an object")));
    };

    let description = match object.get("description") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(ExtractError::Shape(format!(
                "element {position}: description is not a string"
            )));
        }
        None => {
            return Err(ExtractError::Shape(format!(
                "element {position}: missing description"
            )));
        }
    };

    let time = match object.get("time") {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Null) => None,
        Some(_) => {
            return Err(ExtractError::Shape(format!(
                "element {position}: time is not a string"
            )));
        }
        None => {
            return Err(ExtractError::Shape(format!("element {position}: missing time")));
        }
    };

    Ok(TaskRecord::new(description, time))
}

/// Parse a delete-target response. Anything other than an object with a
/// non-negative `index` and a non-null `description` means the request was
/// not understood. Range checking is left to the task store.
pub fn parse_delete_target(cleaned: &str) -> Option<DeleteTarget> {
    let value: Value = serde_json::from_str(cleaned).ok()?;
    let object = value.as_object()?;

    let index = match object.get("index")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    let description = match object.get("description")? {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };

    Some(DeleteTarget { index, description })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_tasks() {
        let tasks = parse_tasks(
            r#"[{"description": "buy milk", "time": null},
                {"description": "call mom", "time": "2025-04-22 18:00"}]"#,
        )
        .unwrap();
        assert_eq!(
            tasks,
            vec![
                TaskRecord::new("buy milk", None),
                TaskRecord::new("call mom", Some("2025-04-22 18:00".into())),
            ]
        );
    }

    #[test]
    fn single_object_becomes_one_element_list() {
        let tasks = parse_tasks(r#"{"description": "gym", "time": "2025-04-22 07:00"}"#).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "gym");
    }

    #[test]
    fn missing_time_key_is_a_shape_error() {
        let err = parse_tasks(r#"[{"description": "gym"}]"#).unwrap_err();
        assert!(matches!(err, ExtractError::Shape(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn numeric_time_is_rejected() {
        let err = parse_tasks(r#"[{"description": "gym", "time": 7}]"#).unwrap_err();
        assert!(matches!(err, ExtractError::Shape(_)));
    }

    #[test]
    fn prose_is_a_retryable_syntax_error() {
        let err = parse_tasks("Sure! Here are your tasks.").unwrap_err();
        assert!(matches!(err, ExtractError::Syntax(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn empty_array_is_empty() {
        assert!(matches!(parse_tasks("[]"), Err(ExtractError::Empty)));
    }

    #[test]
    fn scalar_is_a_shape_error() {
        assert!(matches!(parse_tasks("42"), Err(ExtractError::Shape(_))));
    }

    #[test]
    fn delete_target_variants() {
        assert_eq!(
            parse_delete_target(r#"{"index": 2, "description": "call mom"}"#),
            Some(DeleteTarget {
                index: 2,
                description: "call mom".into()
            })
        );
        assert_eq!(
            parse_delete_target(r#"{"index": "3", "description": "gym"}"#).map(|t| t.index),
            Some(3)
        );
        assert_eq!(parse_delete_target("null"), None);
        assert_eq!(parse_delete_target(r#"{"index": null, "description": "gym"}"#), None);
        assert_eq!(parse_delete_target(r#"{"index": 1, "description": null}"#), None);
        assert_eq!(parse_delete_target(r#"{"index": 1}"#), None);
        assert_eq!(
            parse_delete_target(r#"{"index": 0, "description": "gym"}"#).map(|t| t.index),
            Some(0)
        );
        assert_eq!(
            parse_delete_target(r#"{"index": -1, "description": "gym"}"#).map(|t| t.index),
            Some(-1)
        );
        assert_eq!(parse_delete_target(r#"{"index": 1.5, "description": "gym"}"#), None);
        assert_eq!(parse_delete_target("the second one"), None);
    }
}
