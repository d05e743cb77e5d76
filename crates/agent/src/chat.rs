//! One chat exchange: assemble the prompt, call the provider once, inspect
//! the reply.
//!
//! The service holds no conversation state. The caller supplies the
//! knowledge snapshot and the full history on every call.

use crate::prompt::PromptAssembler;
use crate::reply::{ReplyFormat, inspect_reply};
use kbdesk_core::error::{Error, Result};
use kbdesk_core::knowledge::KnowledgeRecord;
use kbdesk_core::message::ChatTurn;
use kbdesk_core::provider::Provider;
use std::sync::Arc;
use tracing::{debug, warn};

/// The model's answer for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub format: ReplyFormat,
    /// Size of the snapshot the reply was produced against.
    pub entry_count: usize,
}

#[derive(Clone)]
pub struct ChatService {
    provider: Arc<dyn Provider>,
    assembler: PromptAssembler,
}

impl ChatService {
    pub fn new(provider: Arc<dyn Provider>, assembler: PromptAssembler) -> Self {
        Self { provider, assembler }
    }

    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    pub async fn respond<R: KnowledgeRecord + Sync>(
        &self,
        knowledge: &[R],
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::Validation("message is required".into()));
        }

        let prompt = self.assembler.assemble(knowledge, history, message);
        debug!(
            provider = self.provider.name(),
            entries = prompt.entry_count,
            history = history.len(),
            "Sending chat turn"
        );

        let raw = self.provider.send(&prompt.messages).await?;

        let reply = inspect_reply(
            &raw,
            knowledge,
            &self.assembler.settings().not_documented_message,
        );
        if !reply.format.is_conforming() {
            warn!(
                entries = prompt.entry_count,
                reply = %reply.text,
                "Reply does not follow the output format"
            );
        }

        Ok(ChatReply {
            text: reply.text,
            format: reply.format,
            entry_count: prompt.entry_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use kbdesk_core::error::ProviderError;
    use kbdesk_core::knowledge::NewKnowledge;
    use kbdesk_core::message::Role;

    fn base() -> Vec<NewKnowledge> {
        vec![
            NewKnowledge::new("Erro de login", "Resetar senha no portal"),
            NewKnowledge::new("Tela branca", "Limpar cache"),
        ]
    }

    fn chat(provider: Arc<ScriptedProvider>) -> ChatService {
        ChatService::new(provider, PromptAssembler::default())
    }

    #[tokio::test]
    async fn indexed_reply() {
        let provider = Arc::new(ScriptedProvider::replies(["1 - Resetar senha no portal"]));
        let reply = chat(provider.clone())
            .respond(&base(), &[], "não consigo logar")
            .await
            .unwrap();

        assert_eq!(reply.format, ReplyFormat::Indexed { index: 1 });
        assert_eq!(reply.entry_count, 2);

        let calls = provider.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].role, Role::System);
        assert!(calls[0][0].content.contains("Question: Erro de login"));
        assert_eq!(calls[0].last().unwrap().content, "não consigo logar");
    }

    #[tokio::test]
    async fn history_is_forwarded() {
        let provider = Arc::new(ScriptedProvider::replies(["2 - Limpar cache"]));
        let history = vec![
            ChatTurn::user("liste"),
            ChatTurn::model("1 - Erro de login\n\n2 - Tela branca"),
        ];
        chat(provider.clone()).respond(&base(), &history, "e o 2?").await.unwrap();

        let sent = &provider.calls().await[0];
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn unformatted_reply_is_returned_not_rejected() {
        let provider = Arc::new(ScriptedProvider::replies(["Try turning it off and on."]));
        let reply = chat(provider).respond(&base(), &[], "help").await.unwrap();
        assert_eq!(reply.format, ReplyFormat::Unformatted);
        assert_eq!(reply.text, "Try turning it off and on.");
    }

    #[tokio::test]
    async fn blank_message_is_validation_error_without_provider_call() {
        let provider = Arc::new(ScriptedProvider::replies(["1 - x"]));
        let err = chat(provider.clone()).respond(&base(), &[], "   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(provider.call_count().await, 0);
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Upstream {
            status: Some(503),
            body: "down".into(),
        })]));
        let err = chat(provider).respond(&base(), &[], "help").await.unwrap_err();
        assert_eq!(err.kind(), "upstream");
    }
}
