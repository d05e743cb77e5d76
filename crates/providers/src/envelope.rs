//! Response envelope resolution.
//!
//! Generation endpoints wrap the answer text in different JSON shapes. The
//! shape is resolved by an ordered rule table: the first rule that yields
//! non-blank text wins.

use serde_json::Value;

/// The shape the answer text was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Top-level `output` string.
    Output(String),
    /// Top-level `content`, either a string or an array of `{text}` parts.
    Content(String),
    /// OpenAI-style `choices[0].message.content`.
    Choices(String),
    /// Gemini-style `candidates[0].content.parts[*].text`.
    Candidates(String),
}

impl Envelope {
    pub fn shape(&self) -> &'static str {
        match self {
            Envelope::Output(_) => "output",
            Envelope::Content(_) => "content",
            Envelope::Choices(_) => "choices",
            Envelope::Candidates(_) => "candidates",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Envelope::Output(t)
            | Envelope::Content(t)
            | Envelope::Choices(t)
            | Envelope::Candidates(t) => t,
        }
    }
}

type Rule = fn(&Value) -> Option<Envelope>;

/// Extraction rules in priority order.
const RULES: &[Rule] = &[output_rule, content_rule, choices_rule, candidates_rule];

/// Resolve the envelope of a response body. `None` means no rule found text.
pub fn resolve(body: &Value) -> Option<Envelope> {
    RULES.iter().find_map(|rule| rule(body))
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Concatenate the `text` of every part that has one.
fn join_parts(parts: &[Value]) -> String {
    parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}

fn output_rule(body: &Value) -> Option<Envelope> {
    body.get("output")
        .and_then(Value::as_str)
        .and_then(non_blank)
        .map(Envelope::Output)
}

fn content_rule(body: &Value) -> Option<Envelope> {
    let text = match body.get("content")? {
        Value::String(s) => s.clone(),
        Value::Array(parts) => join_parts(parts),
        _ => return None,
    };
    non_blank(&text).map(Envelope::Content)
}

fn choices_rule(body: &Value) -> Option<Envelope> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .and_then(non_blank)
        .map(Envelope::Choices)
}

fn candidates_rule(body: &Value) -> Option<Envelope> {
    let parts = body.pointer("/candidates/0/content/parts")?.as_array()?;
    non_blank(&join_parts(parts)).map(Envelope::Candidates)
}
