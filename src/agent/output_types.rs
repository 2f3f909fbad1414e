use serde::Serialize;
use serde_json::{Map, Value};

/// Routing decision for one user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    General,
    SqlRequired,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::General => "general",
            Classification::SqlRequired => "sql_required",
        }
    }
}

/// Normalized result of one database agent invocation
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutcome {
    /// The agent reply parsed as JSON
    ParsedStructured(Value),
    /// The agent reply could not be parsed; kept verbatim
    RawText(String),
    AdapterError { message: String },
}

/// Structured answer, optionally accompanied by a natural-language summary.
///
/// A summary only ever exists next to non-empty data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    data: Map<String, Value>,
}

impl StructuredValue {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            summary: None,
            data,
        }
    }

    /// Attach a summary. Blank summaries and empty data leave the value unsummarized.
    pub fn with_summary(data: Map<String, Value>, summary: impl Into<String>) -> Self {
        let summary = summary.into().trim().to_string();
        if summary.is_empty() || data.is_empty() {
            return Self::new(data);
        }
        Self {
            summary: Some(summary),
            data,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

/// Value produced for every completed turn and handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseValue {
    Text { text: String },
    Error { message: String },
    Structured(StructuredValue),
}

impl ResponseValue {
    pub fn text(text: impl Into<String>) -> Self {
        ResponseValue::Text { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ResponseValue::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseValue::Error { .. })
    }

    /// Textual form used when a past response is fed back to a model as context.
    pub fn to_prompt_text(&self) -> String {
        match self {
            ResponseValue::Text { text } => text.clone(),
            ResponseValue::Error { message } => format!("[ERROR] {}", message),
            ResponseValue::Structured(structured) => match structured.summary() {
                Some(summary) => serde_json::json!({
                    "summary": summary,
                    "data": structured.data(),
                })
                .to_string(),
                None => Value::Object(structured.data().clone()).to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Map<String, Value> {
        json!({"players": [{"name": "Saka"}]})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn summary_requires_data() {
        let empty = StructuredValue::with_summary(Map::new(), "nothing here");
        assert!(empty.summary().is_none());

        let blank = StructuredValue::with_summary(data(), "   ");
        assert!(blank.summary().is_none());

        let full = StructuredValue::with_summary(data(), " One player. ");
        assert_eq!(full.summary(), Some("One player."));
    }

    #[test]
    fn serializes_with_type_tag() {
        let value = ResponseValue::Structured(StructuredValue::new(data()));
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"type": "structured", "data": {"players": [{"name": "Saka"}]}})
        );

        let err = ResponseValue::error("boom");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"type": "error", "message": "boom"})
        );
    }

    #[test]
    fn prompt_text_covers_every_variant() {
        assert_eq!(ResponseValue::text("hello").to_prompt_text(), "hello");
        assert_eq!(ResponseValue::error("down").to_prompt_text(), "[ERROR] down");

        let plain = ResponseValue::Structured(StructuredValue::new(data()));
        assert_eq!(plain.to_prompt_text(), r#"{"players":[{"name":"Saka"}]}"#);

        let summarized = ResponseValue::Structured(StructuredValue::with_summary(data(), "Just Saka."));
        assert_eq!(
            summarized.to_prompt_text(),
            r#"{"summary":"Just Saka.","data":{"players":[{"name":"Saka"}]}}"#
        );
    }
}
