//! The chat pipeline and knowledge service for kbdesk.
//!
//! A chat turn goes through:
//!
//! 1. **Format** the knowledge snapshot into an indexed context
//! 2. **Assemble** the system instruction and the message sequence
//! 3. **Send** to the provider (one call, no retries)
//! 4. **Inspect** the reply against the output-format rules
//!
//! Matching the question against the knowledge base is left entirely to
//! the model.

pub mod chat;
pub mod formatter;
pub mod knowledge;
pub mod prompt;
pub mod reply;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use chat::{ChatReply, ChatService};
pub use formatter::{EMPTY_KNOWLEDGE_BASE, format_knowledge_context};
pub use knowledge::KnowledgeService;
pub use prompt::{AssembledPrompt, PromptAssembler, PromptSettings};
pub use reply::{InspectedReply, ReplyFormat, inspect_reply};
