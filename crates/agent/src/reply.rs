//! Reply inspection.
//!
//! The model is told to start every reply with `"<index> - "`, to put each
//! listed entry in its own blank-line-separated paragraph, and to use a
//! fixed sentence when nothing matches. Nothing enforces that upstream, so
//! every reply is classified here. A non-conforming reply is still
//! returned to the user; it is only flagged.

use kbdesk_core::knowledge::KnowledgeRecord;
use serde::{Deserialize, Serialize};

/// How a reply relates to the output-format rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ReplyFormat {
    /// A single entry, `"<index> - ..."`.
    Indexed { index: usize },
    /// Several entries, one paragraph each.
    Listing { indices: Vec<usize> },
    /// The not-documented sentence.
    NotDocumented,
    /// No usable prefix, or a leading index outside the snapshot.
    Unformatted,
}

impl ReplyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyFormat::Indexed { .. } => "indexed",
            ReplyFormat::Listing { .. } => "listing",
            ReplyFormat::NotDocumented => "not_documented",
            ReplyFormat::Unformatted => "unformatted",
        }
    }

    /// Every index cited by the reply.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            ReplyFormat::Indexed { index } => vec![*index],
            ReplyFormat::Listing { indices } => indices.clone(),
            ReplyFormat::NotDocumented | ReplyFormat::Unformatted => Vec::new(),
        }
    }

    pub fn is_conforming(&self) -> bool {
        !matches!(self, ReplyFormat::Unformatted)
    }
}

/// A classified reply. `text` is normalized for listings and otherwise the
/// trimmed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedReply {
    pub text: String,
    pub format: ReplyFormat,
}

/// Parse a leading `"<digits> -"` prefix.
fn index_prefix(line: &str) -> Option<usize> {
    let line = line.trim_start();
    let digits_end = line.find(|c: char| !c.is_ascii_digit()).unwrap_or(line.len());
    if digits_end == 0 {
        return None;
    }
    let rest = line[digits_end..].trim_start_matches([' ', '\t']);
    let after_dash = rest.strip_prefix('-')?;
    if !after_dash.is_empty() && !after_dash.starts_with(char::is_whitespace) {
        return None;
    }
    line[..digits_end].parse().ok()
}

fn normalize_sentence(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!'])
        .to_lowercase()
}

/// Text after a validated `"<digits> -"` prefix.
fn after_prefix(line: &str) -> &str {
    line.split_once('-').map_or(line, |(_, rest)| rest.trim_start())
}

/// Lowercased with every whitespace run collapsed to one space.
fn squash(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn opens_with(body: &str, stored: &str) -> bool {
    let stored = squash(stored);
    !stored.is_empty() && squash(body).starts_with(&stored)
}

/// Classify `text` against the format rules for the knowledge snapshot the
/// prompt was built from.
///
/// A reply is a listing only when every prefixed paragraph names its own
/// entry (question or answer). Otherwise the later `"<n> - "` lines belong
/// to the first entry's answer, for instance numbered steps, and the text
/// is returned unchanged.
pub fn inspect_reply<R: KnowledgeRecord>(
    text: &str,
    knowledge: &[R],
    not_documented: &str,
) -> InspectedReply {
    let trimmed = text.trim().replace("\r\n", "\n");

    let fallback = normalize_sentence(not_documented);
    if !fallback.is_empty() && trimmed.to_lowercase().contains(&fallback) {
        return InspectedReply {
            text: trimmed,
            format: ReplyFormat::NotDocumented,
        };
    }

    // Group lines into items: a prefixed line opens one, anything else
    // continues the current one.
    let mut items: Vec<(usize, String)> = Vec::new();
    let mut pending_blank = false;
    for line in trimmed.lines() {
        if line.trim().is_empty() {
            pending_blank = true;
            continue;
        }
        match (index_prefix(line), items.last_mut()) {
            (Some(index), _) => items.push((index, line.trim_end().to_string())),
            (None, Some((_, body))) => {
                body.push_str(if pending_blank { "\n\n" } else { "\n" });
                body.push_str(line.trim_end());
            }
            (None, None) => {
                return InspectedReply {
                    text: trimmed,
                    format: ReplyFormat::Unformatted,
                };
            }
        }
        pending_blank = false;
    }

    let entry = |index: usize| index.checked_sub(1).and_then(|i| knowledge.get(i));
    let first = items.first().map(|(index, _)| *index).filter(|i| entry(*i).is_some());
    let Some(first) = first else {
        return InspectedReply {
            text: trimmed,
            format: ReplyFormat::Unformatted,
        };
    };

    // The first entry's stored answer runs on past its own opening paragraph.
    let answer_spans_items = entry(first).is_some_and(|record| {
        let answer = squash(record.answer());
        let opening = squash(after_prefix(&items[0].1));
        answer.len() > opening.len() && opens_with(after_prefix(&trimmed), record.answer())
    });
    let is_listing = items.len() > 1
        && !answer_spans_items
        && items.iter().all(|(index, body)| {
            entry(*index).is_some_and(|record| {
                let body = after_prefix(body);
                opens_with(body, record.question()) || opens_with(body, record.answer())
            })
        });

    if !is_listing {
        return InspectedReply {
            text: trimmed,
            format: ReplyFormat::Indexed { index: first },
        };
    }

    let indices = items.iter().map(|(i, _)| *i).collect();
    let text = items
        .into_iter()
        .map(|(_, body)| body)
        .collect::<Vec<_>>()
        .join("\n\n");

    InspectedReply {
        text,
        format: ReplyFormat::Listing { indices },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbdesk_core::knowledge::NewKnowledge;

    const FALLBACK: &str = "This question is not documented in the knowledge base.";

    fn base() -> Vec<NewKnowledge> {
        vec![
            NewKnowledge::new("Erro de login", "Resetar senha no portal"),
            NewKnowledge::new("Tela branca", "Limpar cache"),
            NewKnowledge::new(
                "Esqueci a senha",
                "Siga os passos:\n1 - Abra o portal\n2 - Clique em Esqueci a senha",
            ),
        ]
    }

    #[test]
    fn indexed_answer() {
        let reply = inspect_reply("1 - Resetar senha no portal", &base(), FALLBACK);
        assert_eq!(reply.format, ReplyFormat::Indexed { index: 1 });
        assert_eq!(reply.text, "1 - Resetar senha no portal");
    }

    #[test]
    fn indexed_answer_keeps_multiline_body() {
        let reply = inspect_reply("2 - Passo um\nPasso dois\n", &base(), FALLBACK);
        assert_eq!(reply.format, ReplyFormat::Indexed { index: 2 });
        assert_eq!(reply.text, "2 - Passo um\nPasso dois");
    }

    #[test]
    fn numbered_steps_stay_one_answer() {
        let text = "3 - Siga os passos:\n1 - Abra o portal\n2 - Clique em Esqueci a senha";
        let reply = inspect_reply(text, &base(), FALLBACK);
        assert_eq!(reply.format, ReplyFormat::Indexed { index: 3 });
        assert_eq!(reply.text, text);
    }

    #[test]
    fn numbered_steps_beyond_base_size_stay_one_answer() {
        let steps = "Siga os passos:\n1 - Abra o portal\n2 - Clique em Esqueci\n3 - Confirme";
        let small = vec![NewKnowledge::new("Esqueci a senha", steps)];
        let text = format!("1 - {steps}");
        let reply = inspect_reply(&text, &small, FALLBACK);
        assert_eq!(reply.format, ReplyFormat::Indexed { index: 1 });
        assert_eq!(reply.text, text);
    }

    #[test]
    fn numbered_lines_not_naming_entries_are_left_alone() {
        let text = "1 - Resetar senha:\n\n2 - depois entre de novo";
        let reply = inspect_reply(text, &base(), FALLBACK);
        assert_eq!(reply.format, ReplyFormat::Indexed { index: 1 });
        assert_eq!(reply.text, text);
    }

    #[test]
    fn listing_with_blank_lines() {
        let text = "1 - Erro de login\n\n2 - Tela branca\n\n3 - Esqueci a senha";
        let reply = inspect_reply(text, &base(), FALLBACK);
        assert_eq!(reply.format, ReplyFormat::Listing { indices: vec![1, 2, 3] });
        assert_eq!(reply.text, text);
        assert_eq!(reply.text.split("\n\n").count(), 3);
    }

    #[test]
    fn listing_with_single_newlines_is_normalized() {
        let reply = inspect_reply(
            "1 - Erro de login\n2 - Tela branca\r\n3 - Esqueci a senha",
            &base(),
            FALLBACK,
        );
        assert_eq!(reply.format, ReplyFormat::Listing { indices: vec![1, 2, 3] });
        assert_eq!(reply.text, "1 - Erro de login\n\n2 - Tela branca\n\n3 - Esqueci a senha");
    }

    #[test]
    fn listing_of_answers_is_recognized() {
        let text = "1 - Resetar senha no portal\n2 - Limpar cache";
        let reply = inspect_reply(text, &base(), FALLBACK);
        assert_eq!(reply.format, ReplyFormat::Listing { indices: vec![1, 2] });
        assert_eq!(reply.text, "1 - Resetar senha no portal\n\n2 - Limpar cache");
    }

    #[test]
    fn extra_blank_lines_collapse_to_one() {
        let reply = inspect_reply("1 - Erro de login\n\n\n\n2 - Tela branca", &base(), FALLBACK);
        assert_eq!(reply.text, "1 - Erro de login\n\n2 - Tela branca");
    }

    #[test]
    fn not_documented_sentence() {
        let reply = inspect_reply(
            "This question is not documented in the knowledge base.",
            &base(),
            FALLBACK,
        );
        assert_eq!(reply.format, ReplyFormat::NotDocumented);
        assert!(reply.format.indices().is_empty());
    }

    #[test]
    fn not_documented_matches_loosely() {
        let reply = inspect_reply(
            "0 - this question is NOT documented in the knowledge base",
            &base(),
            FALLBACK,
        );
        assert_eq!(reply.format, ReplyFormat::NotDocumented);
    }

    #[test]
    fn out_of_range_index_is_unformatted() {
        for text in ["4 - something", "0 - something"] {
            let reply = inspect_reply(text, &base(), FALLBACK);
            assert_eq!(reply.format, ReplyFormat::Unformatted);
        }
    }

    #[test]
    fn missing_prefix_is_unformatted() {
        let reply = inspect_reply("Resetar senha no portal", &base(), FALLBACK);
        assert_eq!(reply.format, ReplyFormat::Unformatted);
        assert_eq!(reply.text, "Resetar senha no portal");
        assert!(!reply.format.is_conforming());
    }

    #[test]
    fn prefix_requires_dash_separator() {
        assert_eq!(index_prefix("1 - a"), Some(1));
        assert_eq!(index_prefix("12- a"), Some(12));
        assert_eq!(index_prefix("  3 -"), Some(3));
        assert_eq!(index_prefix("1-800 number"), None);
        assert_eq!(index_prefix("1. a"), None);
        assert_eq!(index_prefix("- a"), None);
    }

    #[test]
    fn format_names_and_indices() {
        let listing = ReplyFormat::Listing { indices: vec![2, 5] };
        assert_eq!(listing.as_str(), "listing");
        assert_eq!(listing.indices(), vec![2, 5]);
        assert_eq!(ReplyFormat::Indexed { index: 4 }.indices(), vec![4]);
    }

    #[test]
    fn empty_base_rejects_every_index() {
        let empty: Vec<NewKnowledge> = Vec::new();
        assert_eq!(inspect_reply("1 - a", &empty, FALLBACK).format, ReplyFormat::Unformatted);
    }
}
