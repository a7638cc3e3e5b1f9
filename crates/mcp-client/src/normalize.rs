//! Normalization of `tools/call` results.
//!
//! A tool may answer with a structured `json` entry or with `text` that may
//! itself hold JSON. [`extract`] folds both into one [`Value`] so assertions
//! never care which representation the server picked.

use serde_json::Value;

use crate::error::ClientError;

/// One entry of a tool result's `content` array.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEntry {
    /// `{"type": "json", "value": ...}`
    Json(Value),
    /// `{"type": "text", "text": "..."}`
    Text(String),
    /// Any other entry, kept verbatim.
    Other(Value),
}

impl ContentEntry {
    pub fn from_value(entry: &Value) -> Self {
        match entry.get("type").and_then(Value::as_str) {
            Some("json") => Self::Json(entry.get("value").cloned().unwrap_or(Value::Null)),
            Some("text") => match entry.get("text").and_then(Value::as_str) {
                Some(text) => Self::Text(text.to_string()),
                None => Self::Other(entry.clone()),
            },
            _ => Self::Other(entry.clone()),
        }
    }
}

/// Parsed `tools/call` result.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub content: Vec<ContentEntry>,
    pub is_error: bool,
    raw: Value,
}

impl ToolResult {
    /// # Errors
    ///
    /// [`ClientError::UnusableResult`] if `content` is missing or not an array.
    pub fn parse(result: &Value) -> Result<Self, ClientError> {
        let entries = result
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| ClientError::UnusableResult {
                payload: result.clone(),
            })?;
        Ok(Self {
            content: entries.iter().map(ContentEntry::from_value).collect(),
            is_error: result
                .get("isError")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            raw: result.clone(),
        })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Collapse the content into a single value.
    ///
    /// A `json` entry wins. Otherwise the first `text` entry is used: parsed
    /// as JSON when its trimmed text opens with `{` or `[` and parses, else
    /// returned as the raw string.
    ///
    /// # Errors
    ///
    /// [`ClientError::UnusableResult`] if neither kind of entry is present.
    pub fn value(&self) -> Result<Value, ClientError> {
        if let Some(value) = self.content.iter().find_map(|e| match e {
            ContentEntry::Json(v) => Some(v),
            _ => None,
        }) {
            return Ok(value.clone());
        }

        if let Some(text) = self.content.iter().find_map(|e| match e {
            ContentEntry::Text(t) => Some(t),
            _ => None,
        }) {
            let trimmed = text.trim();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                if let Ok(parsed) = serde_json::from_str(trimmed) {
                    return Ok(parsed);
                }
            }
            return Ok(Value::String(text.clone()));
        }

        Err(ClientError::UnusableResult {
            payload: self.raw.clone(),
        })
    }
}

/// Normalize a raw `tools/call` result into one value.
///
/// # Errors
///
/// [`ClientError::UnusableResult`] when no `json` or `text` entry exists.
pub fn extract(result: &Value) -> Result<Value, ClientError> {
    ToolResult::parse(result)?.value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> Value {
        json!({"content": [{"type": "text", "text": s}]})
    }

    #[test]
    fn json_entry_is_returned_directly() {
        let result = json!({"content": [
            {"type": "text", "text": "ignored"},
            {"type": "json", "value": {"basename": "file.txt"}},
        ]});
        assert_eq!(extract(&result).unwrap(), json!({"basename": "file.txt"}));
    }

    #[test]
    fn structured_value_is_unchanged() {
        for value in [json!(["l2", "l3"]), json!({"a": 1}), json!(42), json!("plain")] {
            let result = json!({"content": [{"type": "json", "value": value.clone()}]});
            assert_eq!(extract(&result).unwrap(), value);
        }
    }

    #[test]
    fn text_holding_json_is_parsed() {
        assert_eq!(extract(&text(r#"["l2","l3","l4"]"#)).unwrap(), json!(["l2", "l3", "l4"]));
        assert_eq!(extract(&text("  {\"n\": 3}\n")).unwrap(), json!({"n": 3}));
    }

    #[test]
    fn plain_text_round_trips() {
        for s in ["hello\n", "", "  spaced  ", "42", "true"] {
            assert_eq!(extract(&text(s)).unwrap(), json!(s));
        }
    }

    #[test]
    fn broken_json_text_is_returned_raw() {
        assert_eq!(extract(&text("{not json")).unwrap(), json!("{not json"));
    }

    #[test]
    fn first_text_entry_wins() {
        let result = json!({"content": [
            {"type": "image", "data": "..."},
            {"type": "text", "text": "first"},
            {"type": "text", "text": "second"},
        ]});
        assert_eq!(extract(&result).unwrap(), json!("first"));
    }

    #[test]
    fn no_usable_entry_is_an_error() {
        let result = json!({"content": [{"type": "image", "data": "..."}]});
        assert!(matches!(
            extract(&result).unwrap_err(),
            ClientError::UnusableResult { .. }
        ));
        let empty = json!({"content": []});
        assert!(extract(&empty).is_err());
    }

    #[test]
    fn missing_content_is_an_error() {
        assert!(matches!(
            extract(&json!({"value": 1})).unwrap_err(),
            ClientError::UnusableResult { .. }
        ));
        assert!(extract(&Value::Null).is_err());
    }

    #[test]
    fn tool_result_reads_is_error_flag() {
        let result = json!({"content": [{"type": "text", "text": "x"}], "isError": true});
        let parsed = ToolResult::parse(&result).unwrap();
        assert!(parsed.is_error);
        assert_eq!(parsed.content, vec![ContentEntry::Text("x".to_string())]);
    }
}
