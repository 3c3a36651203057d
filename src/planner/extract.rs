//! Text extraction from structured backend replies.
//!
//! Providers wrap generated text in incompatible envelopes. Each extractor
//! below recognizes one envelope; they are tried in order and the first match
//! wins. Supporting a new provider means appending an entry to [`EXTRACTORS`].

use serde_json::Value;

pub type Extractor = fn(&Value) -> Option<String>;

pub const EXTRACTORS: &[(&str, Extractor)] = &[
    ("string", bare_string),
    ("choices.text", choices_text),
    ("choices.message", choices_message),
    ("output.content", output_content),
    ("result", result_field),
];

/// Extract generated text, falling back to the serialized value when no
/// envelope matches.
pub fn extract_text(value: &Value) -> String {
    for (name, extractor) in EXTRACTORS {
        if let Some(text) = extractor(value) {
            log::debug!("extracted backend text via `{name}` envelope");
            return text;
        }
    }

    log::debug!("no known envelope matched; using serialized reply");
    value.to_string()
}

fn non_empty(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

// An empty string still counts as a string reply.
fn bare_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn choices_text(value: &Value) -> Option<String> {
    non_empty(value.get("choices")?.get(0)?.get("text")?)
}

fn choices_message(value: &Value) -> Option<String> {
    non_empty(value.get("choices")?.get(0)?.get("message")?.get("content")?)
}

fn output_content(value: &Value) -> Option<String> {
    let content = value.get("output")?.get(0)?.get("content")?;

    if let Some(text) = non_empty(content) {
        return Some(text);
    }

    // Responses-style envelopes carry a list of typed parts.
    let joined = content
        .as_array()?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");

    (!joined.is_empty()).then_some(joined)
}

fn result_field(value: &Value) -> Option<String> {
    non_empty(value.get("result")?)
}
