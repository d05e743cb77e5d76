//! `kbdesk serve` - Start the HTTP gateway.

use std::path::PathBuf;

pub async fn run(
    host: Option<String>,
    port: Option<u16>,
    database: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }
    if let Some(database) = database {
        config.store.path = Some(database.to_string_lossy().into_owned());
    }

    if !config.has_api_key() {
        eprintln!("  ⚠️  No LLM API key configured. Chat requests will fail until one is set");
        eprintln!("      (KBDESK_API_KEY, GEMINI_API_KEY or OPENAI_API_KEY).");
    }
    if !config.has_admin_password() {
        eprintln!("  ⚠️  No admin password configured. Knowledge edits are disabled");
        eprintln!("      (set KBDESK_ADMIN_PASSWORD or admin_password in config.toml).");
    }

    println!("🚀 kbdesk gateway on http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Database: {}", config.database_path().display());

    kbdesk_gateway::start(config).await
}
