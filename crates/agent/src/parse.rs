//! Defensive decoding of model output.
//!
//! Model text is untrusted: it may wrap JSON in a fenced block, drift from the
//! requested schema, or not be JSON at all. Everything here either yields a
//! typed value or hands the raw text back untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Result of decoding one model reply.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelReply<T> {
    Structured(T),
    Unparseable { raw: String, error: String },
}

impl<T> ModelReply<T> {
    pub fn structured(self) -> Option<T> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Unparseable { .. } => None,
        }
    }
}

/// Returns the body of the first ```` ```json ```` (or bare ```` ``` ````) fence,
/// extending to the last closing fence. Text without a fence is returned trimmed.
pub fn strip_fences(text: &str) -> &str {
    for opener in ["```json\n", "```\n"] {
        let Some(start) = text.find(opener) else {
            continue;
        };
        let body_start = start + opener.len();
        if let Some(end) = text[body_start..].rfind("\n```") {
            return &text[body_start..body_start + end];
        }
    }
    text.trim()
}

pub fn parse_reply<T: DeserializeOwned>(raw: &str) -> ModelReply<T> {
    match serde_json::from_str::<T>(strip_fences(raw)) {
        Ok(value) => ModelReply::Structured(value),
        Err(error) => ModelReply::Unparseable { raw: raw.to_string(), error: error.to_string() },
    }
}

/// Accepts strings, numbers, booleans and lists of those where a single piece of
/// text is expected. Lists are joined with ", ". Blank text becomes `None`.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_of))
}

/// Accepts a list of text-like values or a single one.
pub fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(values)) => values.iter().filter_map(text_of).collect(),
        Some(other) => text_of(&other).into_iter().collect(),
        None => Vec::new(),
    })
}

fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(values) => {
            values.iter().filter_map(text_of).collect::<Vec<_>>().join(", ")
        }
        Value::Null | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::Value;

    use super::{lenient_list, lenient_text, parse_reply, strip_fences, ModelReply};

    #[test]
    fn json_fence_is_stripped() {
        let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nHope that helps.";
        assert_eq!(strip_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn bare_fence_is_stripped() {
        assert_eq!(strip_fences("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn closing_fence_match_is_greedy() {
        let raw = "```json\n{\"text\": \"use ``` carefully\"}\n```\ntrailer\n```";
        assert_eq!(strip_fences(raw), "{\"text\": \"use ``` carefully\"}\n```\ntrailer");
    }

    #[test]
    fn unfenced_text_is_trimmed() {
        assert_eq!(strip_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(strip_fences("```json {\"a\": 1}```"), "```json {\"a\": 1}```");
    }

    #[test]
    fn fenced_and_plain_json_decode_identically() {
        let plain = r#"{"analysis":"ok","recommendations":[{"id":"m1"}]}"#;
        let fenced = format!("```json\n{plain}\n```");

        let left = parse_reply::<Value>(plain).structured();
        let right = parse_reply::<Value>(&fenced).structured();

        assert!(left.is_some());
        assert_eq!(left, right);
    }

    #[test]
    fn invalid_json_keeps_raw_text() {
        let raw = "```json\n{\"analysis\": \"trunc";

        match parse_reply::<Value>(raw) {
            ModelReply::Unparseable { raw: kept, error } => {
                assert_eq!(kept, raw);
                assert!(!error.is_empty());
            }
            ModelReply::Structured(value) => panic!("unexpected value {value}"),
        }
    }

    #[derive(Deserialize)]
    struct Loose {
        #[serde(default, deserialize_with = "lenient_text")]
        text: Option<String>,
        #[serde(default, deserialize_with = "lenient_list")]
        list: Vec<String>,
    }

    #[test]
    fn lenient_fields_accept_schema_drift() {
        let loose: Loose =
            serde_json::from_str(r#"{"text": ["Avoid alcohol", "Take with food"], "list": "one"}"#)
                .expect("decode");
        assert_eq!(loose.text.as_deref(), Some("Avoid alcohol, Take with food"));
        assert_eq!(loose.list, vec!["one".to_string()]);

        let numeric: Loose = serde_json::from_str(r#"{"text": 42, "list": [1, null, "  "]}"#)
            .expect("decode");
        assert_eq!(numeric.text.as_deref(), Some("42"));
        assert_eq!(numeric.list, vec!["1".to_string()]);

        let blank: Loose = serde_json::from_str(r#"{"text": "   "}"#).expect("decode");
        assert_eq!(blank.text, None);
        assert!(blank.list.is_empty());
    }
}
