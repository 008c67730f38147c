//! Transports for taskmate.
//!
//! Available channels:
//! - **CLI** — Interactive terminal chat (stdin/stdout)
//! - **Webhook** — Signature and allowlist checks for inbound HTTP webhooks
//! - **TwiML** — XML replies for the WhatsApp webhook

pub mod cli;
pub mod twiml;
pub mod webhook;

pub use cli::CliChannel;
pub use webhook::{WebhookConfig, WebhookGuard};
