//! Response normalization for loosely-typed model-server replies.
//!
//! Model servers disagree on where the answer lives: some return `{text}`,
//! Ollama returns `{response}`, OpenAI-style servers return
//! `choices[0].message.content`. [`ResponseShape::classify`] matches a reply
//! against those shapes in a fixed precedence and falls back to the raw JSON.
//! The only empty result is a choice message that carries no text content.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// The recognized reply shapes, in precedence order, plus a catch-all.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Top-level `text` string.
    Text(String),
    /// Top-level `response` string (Ollama generate).
    Response(String),
    /// `choices[0].message`, either `{content}` or a bare string.
    ChoiceMessage(String),
    /// `choices[0].text` (completion-style).
    ChoiceText(String),
    /// Nothing recognized; the whole value is kept.
    Other(Value),
}

impl ResponseShape {
    pub fn classify(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::Other(value.clone());
        };

        if let Some(text) = obj.get("text").and_then(Value::as_str) {
            return Self::Text(text.to_string());
        }
        if let Some(text) = obj.get("response").and_then(Value::as_str) {
            return Self::Response(text.to_string());
        }
        if let Some(choice) = obj
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(Value::as_object)
            && let Some(shape) = Self::from_choice(choice)
        {
            return shape;
        }

        Self::Other(value.clone())
    }

    fn from_choice(choice: &Map<String, Value>) -> Option<Self> {
        // An empty `message` does not mask a populated `text`.
        let message = choice.get("message").filter(|m| !is_blank(m));
        match message {
            // A message without string content (e.g. a tool call) is an empty
            // answer; it does not fall back to `text` or the raw body.
            Some(Value::Object(msg)) => {
                let content = msg.get("content").and_then(Value::as_str).unwrap_or("");
                return Some(Self::ChoiceMessage(content.to_string()));
            }
            Some(Value::String(s)) => return Some(Self::ChoiceMessage(s.clone())),
            _ => {}
        }
        choice
            .get("text")
            .and_then(Value::as_str)
            .map(|t| Self::ChoiceText(t.to_string()))
    }

    /// Name of the matched shape, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Response(_) => "response",
            Self::ChoiceMessage(_) => "choices.message",
            Self::ChoiceText(_) => "choices.text",
            Self::Other(_) => "raw",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) | Self::Response(s) | Self::ChoiceMessage(s) | Self::ChoiceText(s) => s,
            Self::Other(Value::String(s)) => s,
            Self::Other(value) => value.to_string(),
        }
    }
}

/// Extract the best-guess answer text from a reply.
pub fn normalize(value: &Value) -> String {
    ResponseShape::classify(value).into_text()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Untyped body returned by a model server.
pub struct RawResponse;

impl RawResponse {
    /// Parse a reply body into a JSON value.
    ///
    /// Accepts a single JSON document, or newline-delimited JSON as emitted by
    /// a streaming generate endpoint, in which case the `response` fragments
    /// are concatenated into one `{"response": ...}` object.
    pub fn parse(body: &str) -> Result<Value> {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Ok(value),
            Err(single_err) => Self::parse_ndjson(body)
                .ok_or_else(|| Error::parse(format!("response body is not JSON: {single_err}"))),
        }
    }

    fn parse_ndjson(body: &str) -> Option<Value> {
        let mut text = String::new();
        let mut lines = 0usize;
        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let chunk: Value = serde_json::from_str(line).ok()?;
            text.push_str(chunk.get("response")?.as_str()?);
            lines += 1;
        }
        (lines > 0).then(|| serde_json::json!({ "response": text }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn top_level_text() {
        assert_eq!(normalize(&json!({"text": "a"})), "a");
    }

    #[test]
    fn top_level_response() {
        assert_eq!(normalize(&json!({"response": "b"})), "b");
    }

    #[test]
    fn choice_message_content() {
        let v = json!({"choices": [{"message": {"content": "c"}}]});
        assert_eq!(ResponseShape::classify(&v), ResponseShape::ChoiceMessage("c".into()));
        assert_eq!(normalize(&v), "c");
    }

    #[test]
    fn choice_text() {
        assert_eq!(normalize(&json!({"choices": [{"text": "d"}]})), "d");
    }

    #[test]
    fn choice_message_as_plain_string() {
        assert_eq!(normalize(&json!({"choices": [{"message": "e"}]})), "e");
    }

    #[test]
    fn unrecognized_object_is_stringified() {
        assert_eq!(normalize(&json!({"foo": 1})), r#"{"foo":1}"#);
    }

    #[test]
    fn text_beats_response_and_choices() {
        let v = json!({
            "choices": [{"text": "z"}],
            "response": "y",
            "text": "x"
        });
        assert_eq!(normalize(&v), "x");
    }

    #[test]
    fn response_beats_choices() {
        let v = json!({"response": "y", "choices": [{"text": "z"}]});
        assert_eq!(normalize(&v), "y");
    }

    #[test]
    fn message_beats_choice_text() {
        let v = json!({"choices": [{"message": {"content": "m"}, "text": "t"}]});
        assert_eq!(normalize(&v), "m");
    }

    #[test]
    fn message_without_content_is_empty_answer() {
        let v = json!({"choices": [{"message": {"content": null}}]});
        assert_eq!(ResponseShape::classify(&v), ResponseShape::ChoiceMessage(String::new()));
        assert_eq!(normalize(&v), "");

        let tool_call = json!({"choices": [{
            "message": {"role": "assistant", "content": null, "tool_calls": []},
            "text": "ignored"
        }]});
        assert_eq!(normalize(&tool_call), "");
    }

    #[test]
    fn empty_message_falls_back_to_choice_text() {
        let v = json!({"choices": [{"message": "", "text": "t"}]});
        assert_eq!(normalize(&v), "t");
    }

    #[test]
    fn non_string_text_field_is_skipped() {
        let v = json!({"text": 5, "response": "r"});
        assert_eq!(normalize(&v), "r");
    }

    #[test]
    fn empty_choices_falls_through_to_raw() {
        let v = json!({"choices": []});
        assert_eq!(ResponseShape::classify(&v).kind(), "raw");
        assert_eq!(normalize(&v), r#"{"choices":[]}"#);
    }

    #[test]
    fn non_object_roots() {
        assert_eq!(normalize(&json!("plain")), "plain");
        assert_eq!(normalize(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn parses_single_document() {
        let v = RawResponse::parse(r#"{"response": "hi", "done": true}"#).unwrap();
        assert_eq!(normalize(&v), "hi");
    }

    #[test]
    fn parses_streamed_generate_lines() {
        let body = concat!(
            r#"{"model":"m","response":"Hel","done":false}"#,
            "\n",
            r#"{"model":"m","response":"lo","done":false}"#,
            "\n",
            r#"{"model":"m","response":"","done":true}"#,
            "\n"
        );
        let v = RawResponse::parse(body).unwrap();
        assert_eq!(normalize(&v), "Hello");
    }

    #[test]
    fn rejects_garbage_body() {
        assert!(RawResponse::parse("<html>502 Bad Gateway</html>").is_err());
        assert!(RawResponse::parse("").is_err());
    }
}
