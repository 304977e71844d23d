//! Tolerant recovery of JSON from model output.
//!
//! Models wrap JSON in markdown fences, add prose, or answer with the wrong
//! shape. None of that is an error here: parsers return `None` and the caller
//! logs a preview.

use serde_json::Value;
use tracing::warn;

use crate::types::{EvalVerdict, RoomScore};

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest.trim_start();
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Pass 1 output: a JSON array of room scores.
///
/// Entries without a usable `room` or `score` are dropped.
pub fn parse_room_scores(text: &str) -> Option<Vec<RoomScore>> {
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(strip_code_fences(text)) else {
        return None;
    };

    let rooms = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RoomScore>(entry.clone()) {
            Ok(room) => Some(room),
            Err(e) => {
                warn!(entry = %preview(&entry.to_string(), 200), error = %e, "Dropping malformed room score");
                None
            }
        })
        .collect();
    Some(rooms)
}

/// Pass 2 output: `{"pass": bool, "reasoning": str}`.
///
/// A non-boolean `pass` is read loosely: `null`, `0`, `""` and empty
/// containers reject, anything else keeps the listing.
pub fn parse_eval_verdict(text: &str) -> Option<EvalVerdict> {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(strip_code_fences(text)) else {
        return None;
    };
    let pass = truthy(object.get("pass")?);
    let reasoning = match object.get("reasoning") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Some(EvalVerdict { pass, reasoning })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// First `max_chars` characters, for logs.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
