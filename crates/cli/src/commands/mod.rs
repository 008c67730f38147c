pub mod chat;
pub mod doctor;
pub mod gateway;
pub mod onboard;
pub mod tasks;

use std::sync::Arc;
use taskmate_config::AppConfig;
use taskmate_core::error::ProviderError;
use taskmate_core::provider::Provider;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The configured default provider, or setup instructions when it cannot
/// be built.
pub fn default_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, Box<dyn std::error::Error>> {
    match taskmate_providers::resolve(config) {
        Ok(provider) => Ok(provider),
        Err(ProviderError::NotConfigured(reason)) => {
            eprintln!();
            eprintln!("  ERROR: {reason}");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    TASKMATE_API_KEY = 'sk-...'");
            eprintln!("    OPENAI_API_KEY   = 'sk-...'");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!();
            Err(format!("{reason}. See above for setup instructions.").into())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_provider_needs_a_key() {
        let err = default_provider(&AppConfig::default()).err().unwrap();
        assert!(err.to_string().contains("no API key"));
    }

    #[test]
    fn key_or_local_provider_is_enough() {
        let with_key = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        assert_eq!(default_provider(&with_key).unwrap().name(), "openai");

        let local = AppConfig {
            default_provider: "ollama".into(),
            ..AppConfig::default()
        };
        assert_eq!(default_provider(&local).unwrap().name(), "ollama");
    }
}
