//! Test doubles shared by this crate's tests and the gateway/CLI suites.

use async_trait::async_trait;
use kbdesk_core::error::ProviderError;
use kbdesk_core::message::Message;
use kbdesk_core::provider::Provider;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// A provider that plays back canned outcomes in order and records every
/// message sequence it was sent.
///
/// Once the script runs out every call fails with `EmptyResponse`.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Successful replies only.
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    /// Every message sequence received so far.
    pub async fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, messages: &[Message]) -> Result<String, ProviderError> {
        self.calls.lock().await.push(messages.to_vec());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(ProviderError::EmptyResponse))
    }
}
