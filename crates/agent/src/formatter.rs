//! Knowledge context formatting.
//!
//! Turns a knowledge snapshot into the numbered text block the model sees.
//! Numbering is positional: the n-th record of the slice is `Index: n`.
//! The same slice always renders to the same bytes.

use kbdesk_core::knowledge::KnowledgeRecord;

/// Rendered in place of the records when the snapshot is empty.
pub const EMPTY_KNOWLEDGE_BASE: &str = "(the knowledge base is empty)";

/// Render every record, in the given order, separated by one blank line.
pub fn format_knowledge_context<R: KnowledgeRecord>(entries: &[R]) -> String {
    if entries.is_empty() {
        return EMPTY_KNOWLEDGE_BASE.to_string();
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "Index: {}\nQuestion: {}\nAnswer: {}",
                i + 1,
                entry.question(),
                entry.answer()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
