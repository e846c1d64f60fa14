//! Structured result recovery from free-form agent output.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)```").ok())
        .as_ref()
}

/// Recover a JSON value from agent output text.
///
/// Tries, in order: the first fenced code block (optionally tagged `json`),
/// then the span from the first `{` to the last `}`. If neither parses, the
/// trimmed text is wrapped as `{"result": text}`. Empty text yields `{}`.
pub fn extract(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Object(Map::new());
    }

    // Only the first fenced block is considered
    if let Some(captures) = fence_pattern().and_then(|re| re.captures(text)) {
        let candidate = captures.get(1).map_or("", |m| m.as_str()).trim();
        match serde_json::from_str(candidate) {
            Ok(value) => return value,
            Err(e) => debug!(error = %e, "Fenced block is not valid JSON"),
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            match serde_json::from_str(&text[start..=end]) {
                Ok(value) => return value,
                Err(e) => debug!(error = %e, "Brace-delimited span is not valid JSON"),
            }
        }
    }

    json!({ "result": text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_pattern_compiles() {
        let re = fence_pattern().expect("fence pattern must compile");
        assert!(re.is_match("```json\n{}\n```"));
        assert!(re.is_match("```\n[]\n```"));
    }

    #[test]
    fn test_fenced_json_block() {
        assert_eq!(extract("```json\n{\"a\":1}\n```"), json!({"a": 1}));
        assert_eq!(extract("Result:\n```JSON\n[1, 2]\n```"), json!([1, 2]));
    }

    #[test]
    fn test_untagged_fence() {
        assert_eq!(extract("```\n{\"a\":true}\n```"), json!({"a": true}));
    }

    #[test]
    fn test_brace_span() {
        assert_eq!(extract("noise {\"a\":1} noise"), json!({"a": 1}));
        assert_eq!(
            extract("prefix {\"a\": {\"b\": 2}} suffix"),
            json!({"a": {"b": 2}})
        );
    }

    #[test]
    fn test_plain_text_fallback() {
        assert_eq!(extract("plain text"), json!({"result": "plain text"}));
        assert_eq!(extract("  padded  "), json!({"result": "padded"}));
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(extract(""), json!({}));
        assert_eq!(extract(" \n\t "), json!({}));
    }

    #[test]
    fn test_bad_fence_falls_through_to_braces() {
        let text = "```json\nnot json\n``` but later {\"ok\": 1}";
        assert_eq!(extract(text), json!({"ok": 1}));
    }

    #[test]
    fn test_only_first_fence_is_tried() {
        let text = "```\nnope\n```\n```json\n[1]\n```";
        assert_eq!(extract(text), json!({"result": text}));
    }

    #[test]
    fn test_reversed_braces_fall_back() {
        assert_eq!(extract("} backwards {"), json!({"result": "} backwards {"}));
    }

    #[test]
    fn test_unbalanced_span_falls_back() {
        let text = "{\"a\": 1} and {\"b\": 2}";
        assert_eq!(extract(text), json!({"result": text}));
    }
}
