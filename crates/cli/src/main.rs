//! kbdesk CLI - the main entry point.
//!
//! Commands:
//! - `serve`   - Start the HTTP gateway
//! - `chat`    - Interactive chat client against a running gateway
//! - `import`  - Bulk import a spreadsheet into the knowledge base
//! - `list` / `add` / `delete` / `clear` - Knowledge base administration
//! - `onboard` - Write the default config
//! - `doctor`  - Diagnose configuration and database

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "kbdesk",
    about = "kbdesk: knowledge-base support assistant",
    version
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the SQLite database path
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Chat with the assistant through a running gateway
    Chat {
        /// Gateway base URL
        #[arg(long, env = "KBDESK_SERVER", default_value = "http://127.0.0.1:3000")]
        server: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Import question/answer rows from a spreadsheet (xlsx, xls, ods or csv)
    Import {
        file: PathBuf,

        /// Admin password
        #[arg(long, env = "KBDESK_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Only report what would be imported
        #[arg(long)]
        dry_run: bool,
    },

    /// List knowledge entries, newest first
    List,

    /// Add one knowledge entry
    Add {
        #[arg(short, long)]
        question: String,

        #[arg(short, long)]
        answer: String,

        /// Admin password
        #[arg(long, env = "KBDESK_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Delete a knowledge entry by id
    Delete {
        id: i64,

        /// Admin password
        #[arg(long, env = "KBDESK_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Remove every knowledge entry
    Clear {
        /// Required, since this cannot be undone
        #[arg(long)]
        confirm: bool,

        /// Admin password
        #[arg(long, env = "KBDESK_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Write the default configuration
    Onboard,

    /// Diagnose configuration and database
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
        .init();

    match cli.command {
        Commands::Serve {
            host,
            port,
            database,
        } => commands::serve::run(host, port, database).await?,
        Commands::Chat { server, message } => commands::chat::run(server, message).await?,
        Commands::Import {
            file,
            password,
            dry_run,
        } => commands::import::run(file, password, dry_run).await?,
        Commands::List => commands::admin::list().await?,
        Commands::Add {
            question,
            answer,
            password,
        } => commands::admin::add(question, answer, password).await?,
        Commands::Delete { id, password } => commands::admin::delete(id, password).await?,
        Commands::Clear { confirm, password } => commands::admin::clear(confirm, password).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
