//! CLI channel: interactive terminal chat.
//!
//! Reads lines from stdin (or any async reader), writes replies to stdout.
//! Used by `taskmate chat`. Reserved words such as the exit token are passed
//! through untouched; the session decides what they mean.

use async_trait::async_trait;
use std::sync::Mutex;
use taskmate_core::channel::{Channel, ChannelId, ChannelMessage};
use taskmate_core::error::ChannelError;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

type Input = Box<dyn AsyncRead + Unpin + Send>;

/// Interactive channel for one local user.
pub struct CliChannel {
    id: ChannelId,
    identity: String,
    input: Mutex<Option<Input>>,
}

impl CliChannel {
    /// Chat as `identity`, reading from stdin.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            id: ChannelId("cli".into()),
            identity: identity.into(),
            input: Mutex::new(None),
        }
    }

    /// Read from `reader` instead of stdin.
    pub fn with_input(mut self, reader: impl AsyncRead + Unpin + Send + 'static) -> Self {
        self.input = Mutex::new(Some(Box::new(reader)));
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(32);
        let channel_id = self.id.clone();
        let identity = self.identity.clone();
        let input: Input = match self.input.lock() {
            Ok(mut slot) => slot.take().unwrap_or_else(|| Box::new(io::stdin())),
            Err(_) => {
                return Err(ChannelError::ConnectionLost("input lock poisoned".into()));
            }
        };

        tokio::spawn(async move {
            let mut lines = BufReader::new(input).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }

                        let msg = ChannelMessage {
                            channel_id: channel_id.clone(),
                            sender_id: identity.clone(),
                            sender_name: Some(identity.clone()),
                            content: line,
                            chat_id: "cli_session".into(),
                        };

                        if tx.send(Ok(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, _chat_id: &str, content: &str) -> Result<(), ChannelError> {
        println!("{content}");
        Ok(())
    }

    fn is_allowed(&self, _sender_id: &str) -> bool {
        true // local user
    }
}
