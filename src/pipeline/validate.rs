//! JSON validation of the model response.
//!
//! Strict by default: the reply must be a JSON document and nothing else.
//! The prompt tells the model not to wrap its answer in a ```` ```json ````
//! fence, but models sometimes do it anyway; callers who would rather
//! tolerate that can turn on `strip_code_fences`, which removes one outer
//! fence before parsing. No other repair is attempted.

use crate::error::DocSheetError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

/// Parse `text` as JSON.
pub fn validate_json(text: &str) -> Result<Value, DocSheetError> {
    serde_json::from_str(text).map_err(|e| {
        warn!("Invalid JSON response: {}", e);
        DocSheetError::InvalidJson {
            detail: e.to_string(),
        }
    })
}

/// Parse `text` as JSON, optionally stripping an outer code fence first.
pub fn validate_json_with(text: &str, strip_code_fences: bool) -> Result<Value, DocSheetError> {
    if strip_code_fences {
        validate_json(&strip_outer_fence(text))
    } else {
        validate_json(text)
    }
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap());

/// Remove one ```` ```lang … ``` ```` wrapper around the whole text, if present.
pub fn strip_outer_fence(text: &str) -> String {
    match RE_OUTER_FENCE.captures(text.trim()) {
        Some(caps) => caps[1].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_returned_unchanged() {
        let v = validate_json(r#"{"document_type": "Bill/Invoice", "total_amount": 12.5}"#).unwrap();
        assert_eq!(v, json!({"document_type": "Bill/Invoice", "total_amount": 12.5}));
    }

    #[test]
    fn key_order_is_preserved() {
        let v = validate_json(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn malformed_json_is_format_error() {
        let err = validate_json(r#"{"a":}"#).unwrap_err();
        assert!(matches!(err, DocSheetError::InvalidJson { .. }));
    }

    #[test]
    fn fenced_reply_rejected_when_strict() {
        let reply = "```json\n{\"a\": 1}\n```";
        assert!(validate_json_with(reply, false).is_err());
    }

    #[test]
    fn fenced_reply_accepted_when_stripping() {
        let reply = "```json\n{\"a\": 1}\n```";
        assert_eq!(validate_json_with(reply, true).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn strip_without_fence_is_passthrough() {
        assert_eq!(strip_outer_fence("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_outer_fence("```\n[1]\n```"), "[1]");
    }

    #[test]
    fn bare_scalars_are_still_valid_json() {
        assert_eq!(validate_json("42").unwrap(), json!(42));
        assert_eq!(validate_json("\"hello\"").unwrap(), json!("hello"));
    }
}
