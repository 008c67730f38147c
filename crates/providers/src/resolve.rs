//! Picks the completion backend named by `default_provider`.
//!
//! Every supported backend speaks the chat-completions protocol, so
//! resolution only settles the base URL and the key.

use std::sync::Arc;

use taskmate_config::AppConfig;
use taskmate_core::error::ProviderError;
use taskmate_core::provider::Provider;
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Base URL of a well-known provider.
fn known_base_url(name: &str) -> Option<&'static str> {
    Some(match name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "ollama" => "http://localhost:11434/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    })
}

/// Servers on this machine take no key.
fn is_loopback(base_url: &str) -> bool {
    let rest = base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .unwrap_or(base_url);
    let host = rest.split([':', '/']).next().unwrap_or_default();
    matches!(host, "localhost" | "127.0.0.1")
}

/// Build the configured default provider.
///
/// A provider's own `api_key`/`api_url` win over the global key and the
/// well-known URL. Fails with [`ProviderError::NotConfigured`] when the URL
/// is unknown, or when a remote endpoint has no key.
pub fn resolve(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.default_provider.as_str();
    let own = config.providers.get(name);

    let base_url = own
        .and_then(|p| p.api_url.clone())
        .or_else(|| known_base_url(name).map(String::from))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!("no api_url for provider '{name}'"))
        })?;

    let api_key = match own.and_then(|p| p.api_key.clone()).or_else(|| config.api_key.clone()) {
        Some(key) => key,
        None if is_loopback(&base_url) => String::new(),
        None => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{name}'"
            )));
        }
    };

    debug!(provider = name, base_url = %base_url, model = config.model(), "Provider resolved");
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}
