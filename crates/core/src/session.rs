//! Client-side chat session.
//!
//! The server keeps no chat state. The client holds the ordered turns in
//! memory and resends all of them with every new message.

use crate::message::ChatTurn;
use serde::{Deserialize, Serialize};

/// Ordered, append-only turns of one client session. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns so far, oldest first.
    pub fn history(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Record a completed exchange: the user's message and the model's reply.
    ///
    /// Failed exchanges are not recorded, so a transport error never ends up
    /// in the history resent on the next turn.
    pub fn record_exchange(&mut self, user_text: impl Into<String>, model_text: impl Into<String>) {
        self.turns.push(ChatTurn::user(user_text));
        self.turns.push(ChatTurn::model(model_text));
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
