//! System instruction and message sequence assembly.
//!
//! The instruction has three parts, always in this order:
//!
//! 1. the role/rules preamble (replaceable through configuration)
//! 2. `KNOWLEDGE BASE (<N> entries):` and the formatted context
//! 3. the output-format rules, ending with the not-documented sentence
//!
//! The message sequence is the instruction as one system message, the
//! client's history in order, then the new user message.

use crate::formatter::format_knowledge_context;
use kbdesk_config::PromptConfig;
use kbdesk_core::knowledge::KnowledgeRecord;
use kbdesk_core::message::{ChatTurn, Message};

pub const DEFAULT_PREAMBLE: &str = "\
You are a support assistant. You answer ONLY from the knowledge base below.
Never add information that is not in the knowledge base, never guess, and
never rely on outside knowledge. Match the user's message against the
questions in the knowledge base and reply with the answer of the matching
entry, reproduced exactly as written.";

/// Wording knobs for the instruction.
#[derive(Debug, Clone)]
pub struct PromptSettings {
    pub not_documented_message: String,
    pub preamble_override: Option<String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self::from_config(&PromptConfig::default())
    }
}

impl PromptSettings {
    pub fn from_config(config: &PromptConfig) -> Self {
        Self {
            not_documented_message: config.not_documented_message.clone(),
            preamble_override: config
                .system_prompt_override
                .clone()
                .filter(|p| !p.trim().is_empty()),
        }
    }
}

/// Messages ready for the provider, plus the snapshot size used to bound
/// indices in the reply.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub messages: Vec<Message>,
    pub entry_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    settings: PromptSettings,
}

impl PromptAssembler {
    pub fn new(settings: PromptSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PromptSettings {
        &self.settings
    }

    fn format_rules(&self) -> String {
        format!(
            "OUTPUT FORMAT (mandatory):
- Every reply starts with the index of the entry it comes from, followed by \" - \". Example: \"1 - <answer>\".
- After the prefix, copy the entry's answer exactly as written. Do not paraphrase, shorten or extend it.
- When asked to list the entries, put each entry in its own paragraph as \"<index> - <question>\", separated from the next by exactly one blank line. Never put two entries on the same line.
- When the user refers to an entry by its index, answer with that entry.
- When nothing in the knowledge base matches, reply exactly: {}",
            self.settings.not_documented_message
        )
    }

    /// The full system instruction for a knowledge snapshot.
    pub fn system_instruction<R: KnowledgeRecord>(&self, knowledge: &[R]) -> String {
        let preamble = self
            .settings
            .preamble_override
            .as_deref()
            .unwrap_or(DEFAULT_PREAMBLE);

        format!(
            "{preamble}\n\nKNOWLEDGE BASE ({} entries):\n{}\n\n{}",
            knowledge.len(),
            format_knowledge_context(knowledge),
            self.format_rules()
        )
    }

    /// Build the provider messages for one turn.
    pub fn assemble<R: KnowledgeRecord>(
        &self,
        knowledge: &[R],
        history: &[ChatTurn],
        user_message: &str,
    ) -> AssembledPrompt {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_instruction(knowledge)));
        messages.extend(history.iter().map(Message::from));
        messages.push(Message::user(user_message));

        AssembledPrompt {
            messages,
            entry_count: knowledge.len(),
        }
    }
}
