//! OpenAI-compatible HTTP provider.
//!
//! Posts `{model, messages, temperature}` with bearer auth to a single
//! chat-completions URL and resolves the answer out of whatever envelope
//! comes back. Works with OpenAI, Gemini's OpenAI endpoint, OpenRouter,
//! Ollama, vLLM and anything else speaking that dialect.

use crate::envelope;
use async_trait::async_trait;
use kbdesk_core::error::ProviderError;
use kbdesk_core::message::Message;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Settings for [`HttpProvider`].
#[derive(Clone)]
pub struct HttpProviderSettings {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProviderSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

/// The production generation provider.
///
/// A missing key or URL is not a construction error: the server starts
/// anyway and each chat call fails with `NotConfigured` before any I/O.
pub struct HttpProvider {
    settings: HttpProviderSettings,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(settings: HttpProviderSettings) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &HttpProviderSettings {
        &self.settings
    }

    /// Endpoint and key, or `NotConfigured` naming what is missing.
    fn credentials(&self) -> Result<(&str, &str), ProviderError> {
        let url = self
            .settings
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("no API URL configured".into()))?;
        let key = self
            .settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("no API key configured".into()))?;
        Ok((url, key))
    }
}

#[async_trait]
impl kbdesk_core::Provider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let (url, key) = self.credentials()?;

        let body = ChatRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
        };

        debug!(
            model = %self.settings.model,
            messages = messages.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Upstream {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ProviderError::Upstream {
            status: Some(status.as_u16()),
            body: e.to_string(),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %text, "Provider returned error");
            return Err(ProviderError::Upstream {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| ProviderError::Upstream {
                status: Some(status.as_u16()),
                body: format!("Failed to parse response: {e}"),
            })?;

        match envelope::resolve(&json) {
            Some(envelope) => {
                debug!(shape = envelope.shape(), "Resolved response envelope");
                Ok(envelope.into_text())
            }
            None => {
                warn!("Provider response carried no text");
                Err(ProviderError::EmptyResponse)
            }
        }
    }
}
