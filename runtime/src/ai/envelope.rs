//! Response envelope normalization.
//!
//! The two providers nest their text differently:
//!
//! ```text
//! nested parts: { "candidates": [ { "content": { "parts": [ {"text": ..} ] } } ] }
//! flat items:   { "output": [ { "type": "message", "content": [ {"type": "output_text", "text": ..} ] } ] }
//!               { "output_text": ".." }
//! ```
//!
//! Detection is by shape, not by which provider was called.

use crate::error::{Result, ScreenError};
use serde_json::Value;

/// Extract the analysis text from either envelope.
pub fn normalize(body: &Value) -> Result<String> {
    if let Some(candidates) = body.get("candidates").and_then(Value::as_array) {
        return from_candidates(candidates);
    }
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return Ok(text.trim().to_string());
        }
    }
    if let Some(items) = body.get("output").and_then(Value::as_array) {
        return from_output_items(items);
    }
    Err(ScreenError::ResponseShape(
        "expected `candidates` or `output` in provider response".into(),
    ))
}

fn from_candidates(candidates: &[Value]) -> Result<String> {
    let first = candidates
        .first()
        .ok_or_else(|| ScreenError::ResponseShape("`candidates` is empty".into()))?;

    let text: String = first
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let finish = first
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        return Err(ScreenError::ResponseShape(format!(
            "candidate has no text parts (finishReason: {finish})"
        )));
    }
    Ok(text.trim().to_string())
}

fn from_output_items(items: &[Value]) -> Result<String> {
    let texts: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|c| {
            matches!(
                c.get("type").and_then(Value::as_str),
                Some("output_text") | Some("text") | None
            )
        })
        .filter_map(|c| c.get("text").and_then(Value::as_str))
        .filter(|t| !t.trim().is_empty())
        .collect();

    if texts.is_empty() {
        return Err(ScreenError::ResponseShape(
            "`output` holds no text content".into(),
        ));
    }
    Ok(texts.join("\n\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_parts_are_concatenated() {
        let body = json!({"candidates": [{"content": {"parts": [
            {"text": "Apple is "}, {"text": "doubtful."}
        ]}}]});
        assert_eq!(normalize(&body).unwrap(), "Apple is doubtful.");
    }

    #[test]
    fn test_flat_output_items() {
        let body = json!({"output": [
            {"type": "web_search_call", "status": "completed"},
            {"type": "message", "content": [
                {"type": "output_text", "text": "First."},
                {"type": "refusal", "refusal": "no"},
                {"type": "output_text", "text": "Second."}
            ]}
        ]});
        assert_eq!(normalize(&body).unwrap(), "First.\n\nSecond.");
    }

    #[test]
    fn test_output_text_shortcut() {
        let body = json!({"output_text": "  Summary  ", "output": []});
        assert_eq!(normalize(&body).unwrap(), "Summary");
    }

    #[test]
    fn test_unknown_shape_is_error() {
        let err = normalize(&json!({"choices": [{"message": {"content": "hi"}}]})).unwrap_err();
        assert!(matches!(err, ScreenError::ResponseShape(_)));
    }

    #[test]
    fn test_blocked_candidate_reports_finish_reason() {
        let err = normalize(&json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
        assert!(normalize(&json!({"candidates": []})).is_err());
        assert!(normalize(&json!({"output": [{"type": "message", "content": []}]})).is_err());
    }
}
