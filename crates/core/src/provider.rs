//! Provider trait - the abstraction over the external generation endpoint.
//!
//! A Provider takes the assembled message sequence and returns the answer
//! text. Matching of the user's question against the knowledge base happens
//! entirely on the other side of this call.

use async_trait::async_trait;
use crate::error::ProviderError;
use crate::message::Message;

/// The core Provider trait.
///
/// One call per user turn. Implementations must not retry: a failure is
/// surfaced to the caller immediately.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "http", "scripted").
    fn name(&self) -> &str;

    /// Send the messages and return the extracted answer text.
    async fn send(&self, messages: &[Message]) -> std::result::Result<String, ProviderError>;
}
