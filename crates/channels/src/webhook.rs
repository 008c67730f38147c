//! Inbound webhook checks.
//!
//! Messaging providers POST each user message to the gateway. Before a
//! message reaches a session the gateway verifies the optional HMAC
//! signature over the raw body and the sender allowlist.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use taskmate_config::GatewayConfig;
use taskmate_core::error::ChannelError;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Webhook security configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// HMAC shared secret for signature validation. Empty = no validation.
    pub shared_secret: Option<String>,
    /// Allowed sender identifiers. Empty = deny all, ["*"] = allow all.
    pub allowed_senders: Vec<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            shared_secret: None,
            allowed_senders: vec!["*".into()],
        }
    }
}

impl From<&GatewayConfig> for WebhookConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            shared_secret: config.shared_secret.clone(),
            allowed_senders: config.allowed_senders.clone(),
        }
    }
}

pub struct WebhookGuard {
    config: WebhookConfig,
}

impl WebhookGuard {
    pub fn new(config: WebhookConfig) -> Self {
        Self { config }
    }

    pub fn requires_signature(&self) -> bool {
        self.config
            .shared_secret
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }

    /// Validate a hex HMAC-SHA256 signature of `payload`, with or without a
    /// `sha256=` prefix. Always true when no secret is configured.
    pub fn validate_signature(&self, payload: &[u8], signature: Option<&str>) -> bool {
        let secret = match self.config.shared_secret.as_deref() {
            None | Some("") => return true,
            Some(secret) => secret,
        };
        let Some(signature) = signature else {
            return false;
        };

        let sig_hex = signature.trim();
        let sig_hex = sig_hex.strip_prefix("sha256=").unwrap_or(sig_hex);
        let Ok(provided) = hex::decode(sig_hex) else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            warn!("Webhook secret rejected by HMAC");
            return false;
        };
        mac.update(payload);
        // constant-time
        mac.verify_slice(&provided).is_ok()
    }

    pub fn is_allowed(&self, sender_id: &str) -> bool {
        if self.config.allowed_senders.is_empty() {
            return false;
        }
        if self.config.allowed_senders.iter().any(|s| s == "*") {
            return true;
        }
        self.config.allowed_senders.iter().any(|s| s == sender_id)
    }

    /// Allowlist check as a typed error.
    pub fn authorize(&self, channel: &str, sender_id: &str) -> Result<(), ChannelError> {
        if self.is_allowed(sender_id) {
            Ok(())
        } else {
            Err(ChannelError::Unauthorized {
                channel: channel.into(),
                sender_id: sender_id.into(),
            })
        }
    }
}

/// Hex HMAC-SHA256 of `payload`, the format [`WebhookGuard::validate_signature`] accepts.
pub fn sign(secret: &str, payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guarded(secret: &str) -> WebhookGuard {
        WebhookGuard::new(WebhookConfig {
            shared_secret: Some(secret.into()),
            ..WebhookConfig::default()
        })
    }

    #[test]
    fn default_allows_all() {
        let guard = WebhookGuard::new(WebhookConfig::default());
        assert!(guard.is_allowed("whatsapp:+15550001"));
        assert!(!guard.requires_signature());
    }

    #[test]
    fn specific_senders() {
        let guard = WebhookGuard::new(WebhookConfig {
            allowed_senders: vec!["whatsapp:+15550001".into()],
            ..WebhookConfig::default()
        });
        assert!(guard.is_allowed("whatsapp:+15550001"));
        assert!(!guard.is_allowed("whatsapp:+15550002"));
        assert!(matches!(
            guard.authorize("whatsapp", "whatsapp:+15550002"),
            Err(ChannelError::Unauthorized { .. })
        ));
    }

    #[test]
    fn empty_allowlist_denies() {
        let guard = WebhookGuard::new(WebhookConfig {
            allowed_senders: vec![],
            ..WebhookConfig::default()
        });
        assert!(!guard.is_allowed("anyone"));
    }

    #[test]
    fn no_secret_skips_validation() {
        let guard = WebhookGuard::new(WebhookConfig::default());
        assert!(guard.validate_signature(b"anything", None));
        assert!(guard.validate_signature(b"anything", Some("zz")));
    }

    #[test]
    fn valid_signature_with_and_without_prefix() {
        let guard = guarded("s3cret");
        let sig = sign("s3cret", b"Body=hi").unwrap();
        assert!(guard.validate_signature(b"Body=hi", Some(&sig)));
        assert!(guard.validate_signature(b"Body=hi", Some(&format!("sha256={sig}"))));
    }

    #[test]
    fn bad_signatures_rejected() {
        let guard = guarded("s3cret");
        let sig = sign("other", b"Body=hi").unwrap();
        assert!(!guard.validate_signature(b"Body=hi", Some(&sig)));
        assert!(!guard.validate_signature(b"Body=hi", Some("not-hex")));
        assert!(!guard.validate_signature(b"Body=hi", None));
        let tampered = sign("s3cret", b"Body=bye").unwrap();
        assert!(!guard.validate_signature(b"Body=hi", Some(&tampered)));
    }

    #[test]
    fn from_gateway_config() {
        let config = GatewayConfig {
            shared_secret: Some("k".into()),
            allowed_senders: vec!["a".into()],
            ..GatewayConfig::default()
        };
        let guard = WebhookGuard::new(WebhookConfig::from(&config));
        assert!(guard.requires_signature());
        assert!(!guard.is_allowed("b"));
    }
}
