//! Pull a JSON object out of a model reply.
//!
//! Models asked for JSON still wrap it in prose or Markdown fences now and then.
//! Candidates are tried in order: the whole trimmed reply, the first
//! fenced ```` ``` ```` block (with or without a `json` tag), then the outermost `{...}` span.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Characters of the reply kept in a [`ResponseParseError::NotFound`].
const SNIPPET_CHARS: usize = 200;

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap();
    static ref OBJECT_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

#[derive(Error, Debug)]
pub enum ResponseParseError {
    #[error("reply contains malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no JSON object found in reply: {snippet}")]
    NotFound { snippet: String },
}

pub fn parse_json_response(text: &str) -> Result<Value, ResponseParseError> {
    let text = text.trim();

    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    if let Some(block) = FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str(block.as_str()) {
            return Ok(value);
        }
    }

    match OBJECT_SPAN.find(text) {
        Some(span) => Ok(serde_json::from_str(span.as_str())?),
        None => Err(ResponseParseError::NotFound {
            snippet: text.chars().take(SNIPPET_CHARS).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = parse_json_response("  {\"reply\": \"hola\"}\n").unwrap();
        assert_eq!(value, json!({"reply": "hola"}));
    }

    #[test]
    fn test_fenced_block() {
        let reply = "Aquí está el análisis:\n```json\n{\"variables\": []}\n```\nSaludos.";
        assert_eq!(
            parse_json_response(reply).unwrap(),
            json!({"variables": []})
        );
    }

    #[test]
    fn test_untagged_fence() {
        let reply = "```\n{\"reply\": \"ok\"}\n```";
        assert_eq!(parse_json_response(reply).unwrap(), json!({"reply": "ok"}));
    }

    #[test]
    fn test_embedded_object() {
        let reply = "Claro. {\"is_complete\": true, \"extracted_data\": {}} Listo.";
        assert_eq!(
            parse_json_response(reply).unwrap(),
            json!({"is_complete": true, "extracted_data": {}})
        );
    }

    #[test]
    fn test_malformed_object() {
        let err = parse_json_response("texto {no es json} más texto").unwrap_err();
        assert!(matches!(err, ResponseParseError::Malformed(_)));
    }

    #[test]
    fn test_not_found_keeps_snippet() {
        let reply = "a".repeat(500);
        match parse_json_response(&reply).unwrap_err() {
            ResponseParseError::NotFound { snippet } => assert_eq!(snippet.len(), 200),
            other => panic!("unexpected error: {other}"),
        }
    }
}
