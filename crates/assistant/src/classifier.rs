//! Classifier gateway: every call to the completion service goes through here.
//!
//! The service is used as an opaque text classifier: one fixed system
//! instruction plus the raw user text in, plain text out. Responses are
//! cleaned of markdown code fences before anything parses them.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use taskmate_config::{AppConfig, Vocabulary};
use taskmate_core::error::ProviderError;
use taskmate_core::provider::{Provider, ProviderRequest};
use taskmate_core::TaskRecord;
use tracing::{debug, warn};

use crate::extract::{self, DeleteTarget, ExtractError};
use crate::prompts;

pub struct Classifier {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    intent_prompt: String,
}

impl Classifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            intent_prompt: prompts::intent(&Vocabulary::default()),
        }
    }

    /// Model, sampling settings and intent labels from the loaded config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.model(), config.default_temperature)
            .with_max_tokens(Some(config.default_max_tokens))
            .with_vocabulary(&config.assistant.vocabulary)
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: &Vocabulary) -> Self {
        self.intent_prompt = prompts::intent(vocabulary);
        self
    }

    async fn ask(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let request = ProviderRequest::instruction(&self.model, system, user, self.temperature)
            .with_max_tokens(self.max_tokens);
        let response = self.provider.complete(request).await?;
        Ok(clean_response(&response.message.content))
    }

    /// Ask for an intent label. The result is either one of the configured
    /// labels or free conversational text meant for the user.
    pub async fn classify_intent(&self, text: &str) -> Result<String, ProviderError> {
        let label = self.ask(&self.intent_prompt, text).await?;
        debug!(provider = self.provider.name(), label = %label, "Classified message");
        Ok(label)
    }

    /// Extract task records from free text, resolving relative dates
    /// against `today`.
    ///
    /// A transport or JSON syntax failure is retried once with a stricter
    /// instruction. Shape errors and empty results are final.
    pub async fn extract_tasks(
        &self,
        text: &str,
        today: NaiveDate,
    ) -> Result<Vec<TaskRecord>, ExtractError> {
        let first = match self.ask(&prompts::extract_tasks(today), text).await {
            Ok(raw) => extract::parse_tasks(&raw),
            Err(e) => Err(e.into()),
        };

        match first {
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "Task extraction failed, retrying with strict prompt");
                let raw = self.ask(&prompts::extract_tasks_strict(today), text).await?;
                extract::parse_tasks(&raw)
            }
            other => other,
        }
    }

    /// Identify which of `tasks` the user wants deleted. `None` when the
    /// service fails or its answer does not name a task.
    pub async fn extract_delete_target(
        &self,
        text: &str,
        tasks: &[TaskRecord],
    ) -> Option<DeleteTarget> {
        let listing = json!(
            tasks
                .iter()
                .enumerate()
                .map(|(i, t)| json!({"index": i + 1, "description": t.description, "time": t.time}))
                .collect::<Vec<_>>()
        );

        match self.ask(&prompts::delete_target(&listing.to_string()), text).await {
            Ok(raw) => {
                let target = extract::parse_delete_target(&raw);
                if target.is_none() {
                    debug!(response = %raw, "Delete target not understood");
                }
                target
            }
            Err(e) => {
                warn!(error = %e, "Delete target extraction failed");
                None
            }
        }
    }
}

/// Strip surrounding whitespace and a markdown code fence, with or without
/// a `json` language tag.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.strip_prefix('\n').unwrap_or(rest);
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, scripted_classifier, scripted_classifier_with};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 21).unwrap()
    }

    #[test]
    fn clean_strips_fences() {
        assert_eq!(clean_response("  save \n"), "save");
        assert_eq!(
            clean_response("```json\n[{\"description\": \"gym\"}]\n```"),
            "[{\"description\": \"gym\"}]"
        );
        assert_eq!(clean_response("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(clean_response("```json[1]```"), "[1]");
        assert_eq!(clean_response("no fences here"), "no fences here");
    }

    #[tokio::test]
    async fn intent_sends_instruction_and_raw_text() {
        let (classifier, provider) = scripted_classifier(&["  save\n"]);
        let label = classifier.classify_intent("buy milk tomorrow").await.unwrap();

        assert_eq!(label, "save");
        assert_eq!(provider.user_text(0), "buy milk tomorrow");
        assert!(provider.system_prompt(0).contains("answer exactly: delete-all-tasks"));
    }

    #[tokio::test]
    async fn intent_prompt_follows_vocabulary() {
        let provider = Arc::new(ScriptedProvider::texts(&["שמור"]));
        let vocabulary = Vocabulary {
            save: "שמור".into(),
            ..Vocabulary::default()
        };
        let classifier = Classifier::new(provider.clone(), "m", 0.3).with_vocabulary(&vocabulary);
        classifier.classify_intent("קנה חלב").await.unwrap();
        assert!(provider.system_prompt(0).contains("answer exactly: שמור"));
    }

    #[tokio::test]
    async fn from_config_requests_the_provider_model() {
        let provider = Arc::new(ScriptedProvider::texts(&["show-tasks"]));
        let mut config = AppConfig {
            default_provider: "groq".into(),
            ..AppConfig::default()
        };
        config.providers.insert(
            "groq".into(),
            taskmate_config::ProviderConfig {
                api_key: Some("gsk-test".into()),
                api_url: None,
                default_model: Some("llama-3.1-8b-instant".into()),
            },
        );

        let classifier = Classifier::from_config(provider.clone(), &config);
        classifier.classify_intent("what's on my list").await.unwrap();
        assert_eq!(provider.model(0), "llama-3.1-8b-instant");
    }

    #[tokio::test]
    async fn intent_error_propagates() {
        let (classifier, _) = scripted_classifier_with(ScriptedProvider::new(vec![Err(
            ProviderError::Network("connection refused".into()),
        )]));
        assert!(classifier.classify_intent("hi").await.is_err());
    }

    #[tokio::test]
    async fn extraction_parses_fenced_json() {
        let (classifier, provider) = scripted_classifier(&[
            "```json\n[{\"description\": \"buy milk\", \"time\": \"2025-04-22 09:00\"}]\n```",
        ]);
        let tasks = classifier.extract_tasks("buy milk tomorrow at 9", today()).await.unwrap();

        assert_eq!(tasks, vec![TaskRecord::new("buy milk", Some("2025-04-22 09:00".into()))]);
        assert_eq!(provider.call_count(), 1);
        assert!(provider.system_prompt(0).contains("Today is 2025-04-21"));
    }

    #[tokio::test]
    async fn extraction_retries_once_on_syntax_error() {
        let (classifier, provider) = scripted_classifier(&[
            "Sure, here you go!",
            r#"[{"description": "gym", "time": null}]"#,
        ]);
        let tasks = classifier.extract_tasks("gym", today()).await.unwrap();

        assert_eq!(tasks, vec![TaskRecord::new("gym", None)]);
        assert_eq!(provider.call_count(), 2);
        assert!(provider.system_prompt(1).contains("Return ONLY valid JSON"));
    }

    #[tokio::test]
    async fn extraction_retries_once_on_provider_error() {
        let (classifier, provider) = scripted_classifier_with(ScriptedProvider::new(vec![
            Err(ProviderError::Timeout("slow".into())),
            Ok(r#"{"description": "gym", "time": null}"#.into()),
        ]));
        assert_eq!(classifier.extract_tasks("gym", today()).await.unwrap().len(), 1);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn extraction_gives_up_after_second_failure() {
        let (classifier, provider) = scripted_classifier(&["nope", "still nope"]);
        let err = classifier.extract_tasks("gym", today()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Syntax(_)));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn shape_error_is_not_retried() {
        let (classifier, provider) = scripted_classifier(&[r#"[{"description": "gym"}]"#]);
        let err = classifier.extract_tasks("gym", today()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Shape(_)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn delete_target_lists_positions_from_one() {
        let (classifier, provider) =
            scripted_classifier(&[r#"{"index": 2, "description": "call mom"}"#]);
        let tasks = vec![
            TaskRecord::new("buy milk", None),
            TaskRecord::new("call mom", Some("2025-04-22 18:00".into())),
        ];
        let target = classifier
            .extract_delete_target("remove the call", &tasks)
            .await
            .unwrap();

        assert_eq!(target.index, 2);
        assert_eq!(target.description, "call mom");
        let prompt = provider.system_prompt(0);
        assert!(prompt.contains(r#""index":1"#));
        assert!(prompt.contains(r#""description":"call mom""#));
    }

    #[tokio::test]
    async fn delete_target_none_on_failure() {
        let (classifier, _) = scripted_classifier_with(ScriptedProvider::new(vec![Err(
            ProviderError::RateLimited { retry_after_secs: 5 },
        )]));
        assert!(classifier.extract_delete_target("remove it", &[]).await.is_none());

        let (classifier, _) = scripted_classifier(&["null"]);
        assert!(classifier.extract_delete_target("remove it", &[]).await.is_none());
    }
}
