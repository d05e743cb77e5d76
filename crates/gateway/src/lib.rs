//! HTTP API gateway for kbdesk.
//!
//! Exposes the knowledge CRUD endpoints and the chat endpoint under
//! `/api`, plus `/health`. The server keeps no chat state: every chat
//! request carries its own history and, optionally, its own knowledge
//! snapshot.
//!
//! Built on Axum.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use kbdesk_agent::{ChatService, KnowledgeService, PromptAssembler, PromptSettings};
use kbdesk_config::{AppConfig, GatewayConfig};
use kbdesk_security::SharedSecretPolicy;
use kbdesk_store::SqliteStore;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub knowledge: KnowledgeService,
    pub chat: ChatService,
}

pub type SharedState = Arc<GatewayState>;

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(origin, error = %e, "Invalid CORS origin; cross-origin requests disabled");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS restricted to the configured origin
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::api_router(state))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.cors_origin))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Wire the store, policy, provider and services described by `config`.
pub async fn build_state(config: &AppConfig) -> Result<SharedState, Box<dyn std::error::Error>> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = Arc::new(SqliteStore::new(&db_path.to_string_lossy()).await?);
    let policy = Arc::new(SharedSecretPolicy::from_config(config));
    let provider = kbdesk_providers::build_from_config(config)?;
    let assembler = PromptAssembler::new(PromptSettings::from_config(&config.prompt));

    Ok(Arc::new(GatewayState {
        knowledge: KnowledgeService::new(store, policy),
        chat: ChatService::new(provider, assembler),
    }))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = build_state(&config).await?;
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, database = %config.database_path().display(), "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
