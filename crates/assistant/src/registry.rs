//! Per-identity session registry for multi-user transports.
//!
//! Sessions are created on first contact and kept for the life of the
//! process. Each sits behind its own mutex, so turns for one identity run
//! strictly one at a time while different identities proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use taskmate_config::{AppConfig, AssistantConfig};
use taskmate_core::error::Result;
use taskmate_core::provider::Provider;
use taskmate_storage::FileLayout;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::classifier::Classifier;
use crate::session::{Session, TurnReply};

pub struct SessionRegistry {
    layout: FileLayout,
    classifier: Arc<Classifier>,
    config: AssistantConfig,
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    pub fn new(layout: FileLayout, classifier: Arc<Classifier>, config: AssistantConfig) -> Self {
        Self {
            layout,
            classifier,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(
            FileLayout::new(&config.storage),
            Arc::new(Classifier::from_config(provider, config)),
            config.assistant.clone(),
        )
    }

    /// The session for `identity`, loading it from disk on first use.
    pub async fn session(&self, identity: &str) -> Result<Arc<Mutex<Session>>> {
        if let Some(session) = self.sessions.read().await.get(identity) {
            return Ok(session.clone());
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(identity) {
            return Ok(session.clone());
        }
        let session = Session::load(identity, &self.layout, self.classifier.clone(), &self.config)?;
        let session = Arc::new(Mutex::new(session));
        sessions.insert(identity.to_string(), session.clone());
        debug!(identity, active = sessions.len(), "Session registered");
        Ok(session)
    }

    /// Run one turn for `identity`, saving afterwards when auto-save is on.
    pub async fn process(&self, identity: &str, text: &str) -> Result<TurnReply> {
        let session = self.session(identity).await?;
        let mut session = session.lock().await;
        let reply = session.process_turn(text).await?;
        if self.config.auto_save && !reply.farewell {
            session.save()?;
        }
        Ok(reply)
    }

    /// Persist every loaded session. Keeps going past failures and returns
    /// the first one.
    pub async fn save_all(&self) -> Result<()> {
        let sessions: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let mut first_error = None;
        for session in sessions {
            let session = session.lock().await;
            if let Err(e) = session.save() {
                warn!(identity = session.name(), error = %e, "Failed to save session");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
