//! taskmate CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive chat or single-message mode
//! - `gateway`  — Start the HTTP webhook server
//! - `tasks`    — Print an identity's task list
//! - `onboard`  — Write the default config and data directory
//! - `doctor`   — Diagnose configuration health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "taskmate",
    about = "taskmate — a conversational to-do assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with your assistant
    Chat {
        /// Session identity (defaults to assistant.default_identity)
        #[arg(short, long)]
        name: Option<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the saved task list
    Tasks {
        /// Session identity (defaults to assistant.default_identity)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Initialize configuration and data directory
    Onboard,

    /// Diagnose configuration health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { name, message } => commands::chat::run(name, message).await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Tasks { name } => commands::tasks::run(name)?,
        Commands::Onboard => commands::onboard::run()?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
