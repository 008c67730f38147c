//! `taskmate chat` — Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;

use taskmate_assistant::{Classifier, Session};
use taskmate_channels::CliChannel;
use taskmate_core::channel::Channel;
use taskmate_storage::FileLayout;
use tracing::error;

use super::CommandResult;

pub async fn run(name: Option<String>, message: Option<String>) -> CommandResult {
    let config = super::load_config()?;
    let provider = super::default_provider(&config)?;
    let name = name.unwrap_or_else(|| config.assistant.default_identity.clone());

    let classifier = Arc::new(Classifier::from_config(provider, &config));
    let layout = FileLayout::new(&config.storage);
    let mut session = Session::load(&name, &layout, classifier, &config.assistant)?;

    if let Some(msg) = message {
        // Single message mode
        let reply = session.process_turn(&msg).await?;
        session.save()?;
        println!("{}", reply.text);
        return Ok(());
    }

    println!();
    println!("  taskmate — {name}'s assistant");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.model());
    println!("  Tasks:     {}", session.tasks().len());
    println!("  Data:      {}", layout.data_dir().display());
    println!();
    println!(
        "  Type your message and press Enter. Type '{}' to quit.",
        config.assistant.vocabulary.exit
    );
    println!();

    let channel = CliChannel::new(&name);
    converse(&mut session, &channel).await
}

/// Feed channel messages to the session until the farewell reply or EOF.
/// EOF saves the session the same way the exit token does.
pub async fn converse(session: &mut Session, channel: &dyn Channel) -> CommandResult {
    let mut rx = channel
        .start()
        .await
        .map_err(|e| format!("Channel error: {e}"))?;

    prompt()?;
    while let Some(result) = rx.recv().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                eprintln!("  [Channel Error] {e}");
                break;
            }
        };

        match session.process_turn(&msg.content).await {
            Ok(reply) => {
                let framed = reply
                    .text
                    .lines()
                    .map(|line| format!("  Assistant > {line}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                channel.send(&msg.chat_id, &format!("\n{framed}\n")).await?;
                if reply.farewell {
                    return Ok(());
                }
            }
            Err(e) => {
                error!(identity = session.name(), error = %e, "Turn failed");
                eprintln!("  [Error] {e}");
            }
        }

        prompt()?;
    }

    session.save()?;
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use taskmate_config::AssistantConfig;
    use taskmate_core::error::ProviderError;
    use taskmate_core::message::Message;
    use taskmate_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use taskmate_core::TaskRecord;
    use tempfile::TempDir;

    struct ScriptedProvider(Mutex<VecDeque<&'static str>>);

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let text = self.0.lock().unwrap().pop_front().expect("script exhausted");
            Ok(ProviderResponse {
                message: Message::assistant(text),
                usage: None,
                model: request.model,
            })
        }
    }

    fn session(dir: &TempDir, script: &[&'static str]) -> Session {
        let provider = Arc::new(ScriptedProvider(Mutex::new(script.iter().copied().collect())));
        let classifier = Arc::new(Classifier::new(provider, "test-model", 0.3));
        Session::load(
            "alice",
            &FileLayout::in_dir(dir.path()),
            classifier,
            &AssistantConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn exit_ends_the_loop_and_saves() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, &["save", r#"[{"description": "gym", "time": null}]"#]);
        let channel = CliChannel::new("alice").with_input(&b"gym tonight\nexit\nnever read\n"[..]);

        converse(&mut s, &channel).await.unwrap();

        let files = FileLayout::in_dir(dir.path()).for_identity("alice");
        let tasks: Vec<TaskRecord> = taskmate_storage::load(&files.tasks).unwrap();
        assert_eq!(tasks, vec![TaskRecord::new("gym", None)]);
    }

    #[tokio::test]
    async fn eof_saves_the_conversation() {
        let dir = TempDir::new().unwrap();
        let mut s = session(&dir, &["Hi there!"]);
        let channel = CliChannel::new("alice").with_input(&b"hello\n"[..]);

        converse(&mut s, &channel).await.unwrap();

        let files = FileLayout::in_dir(dir.path()).for_identity("alice");
        let turns: Vec<Message> = taskmate_storage::load(&files.conversation).unwrap();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[2].content, "Hi there!");
    }
}
