pub mod admin;
pub mod chat;
pub mod doctor;
pub mod import;
pub mod onboard;
pub mod serve;

use kbdesk_agent::KnowledgeService;
use kbdesk_config::AppConfig;
use kbdesk_security::SharedSecretPolicy;
use kbdesk_store::SqliteStore;
use std::sync::Arc;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| config_error(&e).into())
}

fn config_error(err: &kbdesk_config::ConfigError) -> kbdesk_core::Error {
    kbdesk_core::Error::Config {
        message: err.to_string(),
    }
}

/// Open the configured database directly, behind the same admin gate the
/// gateway uses.
pub(crate) async fn knowledge_service(
    config: &AppConfig,
) -> Result<KnowledgeService, Box<dyn std::error::Error>> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::new(&db_path.to_string_lossy()).await?;
    Ok(KnowledgeService::new(
        Arc::new(store),
        Arc::new(SharedSecretPolicy::from_config(config)),
    ))
}
