//! Shared test helpers for session tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use taskmate_core::error::ProviderError;
use taskmate_core::message::Message;
use taskmate_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

use crate::classifier::Classifier;

/// A mock provider that replays scripted completions in order and records
/// every request it receives.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every scripted completion succeeds with the given text.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// System instruction of the n-th request.
    pub fn system_prompt(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n].messages[0].content.clone()
    }

    /// User text of the n-th request.
    pub fn user_text(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n].messages[1].content.clone()
    }

    /// Model named by the n-th request.
    pub fn model(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n].model.clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no more responses (call #{call})"));

        next.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// A classifier over a fresh scripted provider.
pub fn scripted_classifier(texts: &[&str]) -> (Arc<Classifier>, Arc<ScriptedProvider>) {
    scripted_classifier_with(ScriptedProvider::texts(texts))
}

pub fn scripted_classifier_with(provider: ScriptedProvider) -> (Arc<Classifier>, Arc<ScriptedProvider>) {
    let provider = Arc::new(provider);
    let classifier = Classifier::new(provider.clone(), "test-model", 0.3);
    (Arc::new(classifier), provider)
}
