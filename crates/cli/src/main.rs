//! Recall CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize config directory and default config
//! - `chat`    — Interactive chat or single-message mode
//! - `ingest`  — Store a context fragment by hand
//! - `query`   — Run a scoped relevance query
//! - `status`  — Show system status

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "recall",
    about = "Recall — context-augmented conversation engine",
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
    /// Initialize configuration directory and default config
    Onboard,

    /// Chat with context-augmented replies
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Store a context fragment
    Ingest {
        /// The text to store
        text: String,

        /// Owner the context belongs to
        #[arg(short, long, default_value = "local")]
        owner: String,

        /// Topic label
        #[arg(short, long, default_value = "general")]
        topic: String,
    },

    /// Query stored contexts by relevance
    Query {
        /// The query text
        text: String,

        /// Owner to scope the query to
        #[arg(short, long, default_value = "local")]
        owner: String,

        /// Topic to scope the query to ("general" matches everything)
        #[arg(short, long, default_value = "general")]
        topic: String,

        /// Maximum similarity candidates before scoping
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,
    },

    /// Show system status
    Status,
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
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Ingest { text, owner, topic } => {
            commands::ingest::run(&owner, &text, &topic).await?
        }
        Commands::Query {
            text,
            owner,
            topic,
            top_k,
        } => commands::query::run(&owner, &text, &topic, top_k).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
