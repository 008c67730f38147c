//! Configuration loading, validation, and management for taskmate.
//!
//! Loads configuration from `~/.taskmate/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.taskmate/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Where and how session files are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// Persona, vocabulary and session behavior
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("storage", &self.storage)
            .field("assistant", &self.assistant)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("shared_secret", &redact(&self.shared_secret))
            .field("allowed_senders", &self.allowed_senders)
            .finish()
    }
}

/// File layout for per-identity data. Every template must contain `{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_tasks_template")]
    pub tasks_template: String,

    #[serde(default = "default_conversation_template")]
    pub conversation_template: String,

    #[serde(default = "default_deleted_tasks_template")]
    pub deleted_tasks_template: String,

    #[serde(default = "default_archive_template")]
    pub archive_template: String,

    #[serde(default = "default_pending_template")]
    pub pending_template: String,
}

fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("data")
}
fn default_tasks_template() -> String {
    "todo_list_{name}.json".into()
}
fn default_conversation_template() -> String {
    "chat_log_{name}.json".into()
}
fn default_deleted_tasks_template() -> String {
    "deleted_tasks_{name}.jsonl".into()
}
fn default_archive_template() -> String {
    "deleted_messages_{name}.json".into()
}
fn default_pending_template() -> String {
    "pending_{name}.json".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            tasks_template: default_tasks_template(),
            conversation_template: default_conversation_template(),
            deleted_tasks_template: default_deleted_tasks_template(),
            archive_template: default_archive_template(),
            pending_template: default_pending_template(),
        }
    }
}

impl StorageConfig {
    /// All templates as `(key, template)` pairs, for validation and display.
    pub fn templates(&self) -> [(&'static str, &str); 5] {
        [
            ("tasks_template", &self.tasks_template),
            ("conversation_template", &self.conversation_template),
            ("deleted_tasks_template", &self.deleted_tasks_template),
            ("archive_template", &self.archive_template),
            ("pending_template", &self.pending_template),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Identity used by `taskmate chat` when no `--name` is given
    #[serde(default = "default_identity")]
    pub default_identity: String,

    /// Content of the leading system turn
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Persist the whole session after every completed turn
    #[serde(default = "default_true")]
    pub auto_save: bool,

    #[serde(default)]
    pub vocabulary: Vocabulary,
}

fn default_identity() -> String {
    "default".into()
}
fn default_persona() -> String {
    "You are a smart personal assistant. Remember what the user tells you and answer clearly and kindly."
        .into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_identity: default_identity(),
            persona: default_persona(),
            auto_save: true,
            vocabulary: Vocabulary::default(),
        }
    }
}

/// The assistant's working-language tokens.
///
/// The five intent labels are what the classifier is told to answer with;
/// the four reserved tokens are literal user inputs. All are compared
/// verbatim except `exit`, which is compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default = "label_save")]
    pub save: String,
    #[serde(default = "label_delete_task")]
    pub delete_task: String,
    #[serde(default = "label_reset")]
    pub reset: String,
    #[serde(default = "label_show_tasks")]
    pub show_tasks: String,
    #[serde(default = "label_delete_all_tasks")]
    pub delete_all_tasks: String,
    #[serde(default = "token_affirmative")]
    pub affirmative: String,
    #[serde(default = "token_negative")]
    pub negative: String,
    #[serde(default = "token_exit")]
    pub exit: String,
    #[serde(default = "token_debug")]
    pub debug: String,
}

fn label_save() -> String {
    "save".into()
}
fn label_delete_task() -> String {
    "delete-task".into()
}
fn label_reset() -> String {
    "reset".into()
}
fn label_show_tasks() -> String {
    "show-tasks".into()
}
fn label_delete_all_tasks() -> String {
    "delete-all-tasks".into()
}
fn token_affirmative() -> String {
    "yes".into()
}
fn token_negative() -> String {
    "no".into()
}
fn token_exit() -> String {
    "exit".into()
}
fn token_debug() -> String {
    "debug".into()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            save: label_save(),
            delete_task: label_delete_task(),
            reset: label_reset(),
            show_tasks: label_show_tasks(),
            delete_all_tasks: label_delete_all_tasks(),
            affirmative: token_affirmative(),
            negative: token_negative(),
            exit: token_exit(),
            debug: token_debug(),
        }
    }
}

impl Vocabulary {
    /// The five intent labels in prompt order.
    pub fn intent_labels(&self) -> [&str; 5] {
        [
            &self.save,
            &self.delete_task,
            &self.reset,
            &self.show_tasks,
            &self.delete_all_tasks,
        ]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let tokens = [
            ("save", &self.save),
            ("delete_task", &self.delete_task),
            ("reset", &self.reset),
            ("show_tasks", &self.show_tasks),
            ("delete_all_tasks", &self.delete_all_tasks),
            ("affirmative", &self.affirmative),
            ("negative", &self.negative),
            ("exit", &self.exit),
            ("debug", &self.debug),
        ];
        if let Some((key, _)) = tokens.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "assistant.vocabulary.{key} must not be empty"
            )));
        }
        if self.affirmative == self.negative {
            return Err(ConfigError::ValidationError(
                "assistant.vocabulary.affirmative and negative must differ".into(),
            ));
        }
        let labels = self.intent_labels();
        for (i, label) in labels.iter().enumerate() {
            if labels[i + 1..].contains(label) {
                return Err(ConfigError::ValidationError(format!(
                    "intent label '{label}' is used twice"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// HMAC-SHA256 secret for `X-Signature` validation. None = no validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,

    /// Allowlist of sender IDs. Empty = deny all. ["*"] = allow all.
    #[serde(default = "default_allowed_senders")]
    pub allowed_senders: Vec<String>,
}

fn default_port() -> u16 {
    4000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_allowed_senders() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            shared_secret: None,
            allowed_senders: default_allowed_senders(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.taskmate/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TASKMATE_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `TASKMATE_PROVIDER`, `TASKMATE_MODEL`, `TASKMATE_DATA_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("TASKMATE_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = lookup("OPENAI_API_KEY");
        }
        if let Some(provider) = lookup("TASKMATE_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("TASKMATE_MODEL") {
            self.default_model = model;
        }
        if let Some(dir) = lookup("TASKMATE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".taskmate")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        for (key, template) in self.storage.templates() {
            if !template.contains("{name}") {
                return Err(ConfigError::ValidationError(format!(
                    "storage.{key} must contain '{{name}}'"
                )));
            }
        }

        if self.assistant.default_identity.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "assistant.default_identity must not be empty".into(),
            ));
        }

        self.assistant.vocabulary.validate()
    }

    /// The model to request: the default provider's own `default_model`
    /// when it sets one, else the global `default_model`.
    pub fn model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            storage: StorageConfig::default(),
            assistant: AssistantConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
