//! Generation provider implementations for kbdesk.
//!
//! All providers implement the `kbdesk_core::Provider` trait.
//! [`build_from_config`] wires the configured HTTP provider.

pub mod envelope;
pub mod http;

pub use envelope::Envelope;
pub use http::{HttpProvider, HttpProviderSettings};

use kbdesk_config::AppConfig;
use kbdesk_core::error::ProviderError;
use std::sync::Arc;
use std::time::Duration;

/// Build the provider described by `[llm]` in the configuration.
pub fn build_from_config(
    config: &AppConfig,
) -> Result<Arc<dyn kbdesk_core::Provider>, ProviderError> {
    let settings = HttpProviderSettings {
        api_url: config.llm.api_url.clone(),
        api_key: config.llm.api_key.clone(),
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        timeout: Duration::from_secs(config.llm.timeout_secs),
    };

    if !config.has_api_key() {
        tracing::warn!("No LLM API key configured; chat requests will fail until one is set");
    }

    Ok(Arc::new(HttpProvider::new(settings)?))
}
