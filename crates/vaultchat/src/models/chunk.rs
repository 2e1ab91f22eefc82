use super::tool::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumIter};

/// Prefix the data-stream protocol reserves for error parts
pub const ERROR_PREFIX: char = '3';

/// Payload of a raw line: parsed JSON when the payload is valid JSON, the text verbatim otherwise.
///
/// Serialized with an explicit `format` tag, since an unparsed payload and a JSON string
/// would otherwise be indistinguishable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "value", rename_all = "snake_case")]
pub enum ChunkData {
    Json(Value),
    Raw(String),
}

impl ChunkData {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ChunkData::Json(value) => Some(value),
            ChunkData::Raw(_) => None,
        }
    }

    /// The payload as a string, when it is either a JSON string or unparsed text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ChunkData::Json(Value::String(s)) => Some(s),
            ChunkData::Json(_) => None,
            ChunkData::Raw(s) => Some(s),
        }
    }

    /// Look up a field when the payload is a JSON object
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|value| value.get(key))
    }
}

/// One minimally parsed wire line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    pub prefix: char,
    pub data: ChunkData,
    pub raw: String,
}

impl RawChunk {
    /// Error part used to report a failed stream to raw consumers
    pub fn error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        let encoded = serde_json::to_string(&message).unwrap_or_default();
        RawChunk {
            prefix: ERROR_PREFIX,
            raw: format!("{}:{}", ERROR_PREFIX, encoded),
            data: ChunkData::Json(Value::String(message)),
        }
    }
}

/// Token accounting reported on finish lines, kept exactly as the server sent it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Usage(Value);

impl Usage {
    pub fn new(prompt_tokens: Option<i64>, completion_tokens: Option<i64>) -> Self {
        let mut fields = Map::new();
        if let Some(prompt) = prompt_tokens {
            fields.insert("promptTokens".to_string(), prompt.into());
        }
        if let Some(completion) = completion_tokens {
            fields.insert("completionTokens".to_string(), completion.into());
        }
        Self(Value::Object(fields))
    }

    pub fn prompt_tokens(&self) -> Option<i64> {
        self.count("promptTokens")
    }

    pub fn completion_tokens(&self) -> Option<i64> {
        self.count("completionTokens")
    }

    /// Reported total, or prompt + completion when the server left it out
    pub fn total(&self) -> Option<i64> {
        self.count("totalTokens")
            .or_else(|| match (self.prompt_tokens(), self.completion_tokens()) {
                (Some(prompt), Some(completion)) => Some(prompt + completion),
                _ => None,
            })
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    fn count(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }
}

impl From<Value> for Usage {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finish {
    pub reason: String,
    pub usage: Option<Usage>,
}

/// Type tag of a [`StreamChunk`], displayed as its wire name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ChunkKind {
    Text,
    ToolCall,
    ToolCallDelta,
    ToolResult,
    MessageId,
    PathInfo,
    Finish,
    Unknown,
    Error,
}

/// A typed semantic event lifted from the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StreamChunk {
    Text(String),
    ToolCall(ToolCall),
    /// Partial tool arguments. Never produced from a wire line, but accepted from
    /// callers that synthesize their own chunk sequences.
    ToolCallDelta(Value),
    ToolResult(ToolResult),
    MessageId(String),
    PathInfo(Value),
    Finish(Finish),
    Unknown(RawChunk),
    Error(String),
}

impl StreamChunk {
    pub fn kind(&self) -> ChunkKind {
        match self {
            StreamChunk::Text(_) => ChunkKind::Text,
            StreamChunk::ToolCall(_) => ChunkKind::ToolCall,
            StreamChunk::ToolCallDelta(_) => ChunkKind::ToolCallDelta,
            StreamChunk::ToolResult(_) => ChunkKind::ToolResult,
            StreamChunk::MessageId(_) => ChunkKind::MessageId,
            StreamChunk::PathInfo(_) => ChunkKind::PathInfo,
            StreamChunk::Finish(_) => ChunkKind::Finish,
            StreamChunk::Unknown(_) => ChunkKind::Unknown,
            StreamChunk::Error(_) => ChunkKind::Error,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamChunk::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, StreamChunk::Finish(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_kind_names_match_wire_types() {
        let names: Vec<String> = ChunkKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "text",
                "tool_call",
                "tool_call_delta",
                "tool_result",
                "message_id",
                "path_info",
                "finish",
                "unknown",
                "error"
            ]
        );
    }

    #[test]
    fn test_error_raw_chunk() {
        let chunk = RawChunk::error("Request failed: 500 Internal Server Error");
        assert_eq!(chunk.prefix, '3');
        assert_eq!(chunk.raw, "3:\"Request failed: 500 Internal Server Error\"");
        assert_eq!(
            chunk.data.as_str(),
            Some("Request failed: 500 Internal Server Error")
        );
    }

    #[test]
    fn test_usage_total_falls_back_to_sum() {
        let usage = Usage::new(Some(10), Some(5));
        assert_eq!(usage.total(), Some(15));

        let reported: Usage =
            serde_json::from_value(json!({"promptTokens": 1, "totalTokens": 9})).unwrap();
        assert_eq!(reported.total(), Some(9));
        assert_eq!(Usage::default().total(), None);
    }

    #[test]
    fn test_usage_keeps_every_reported_field() {
        let reported = json!({"promptTokens": 10.5, "completionTokens": 5, "cachedTokens": 3});
        let usage: Usage = serde_json::from_value(reported.clone()).unwrap();
        assert_eq!(usage.as_value(), &reported);
        assert_eq!(serde_json::to_value(&usage).unwrap(), reported);
        assert_eq!(usage.prompt_tokens(), None);
        assert_eq!(usage.completion_tokens(), Some(5));

        let other_names = Usage::from(json!({"input_tokens": 10, "output_tokens": 5}));
        assert_eq!(other_names.total(), None);
        assert_eq!(other_names.into_value()["input_tokens"], 10);
    }

    #[test]
    fn test_raw_chunk_round_trips() {
        let unparsed = RawChunk {
            prefix: '0',
            data: ChunkData::Raw("{\"broken\":\"json".into()),
            raw: "0:{\"broken\":\"json".into(),
        };
        let as_json_string = RawChunk::error("boom");

        for chunk in [unparsed, as_json_string] {
            let value = serde_json::to_value(&chunk).unwrap();
            assert_eq!(serde_json::from_value::<RawChunk>(value).unwrap(), chunk);
        }
        assert_eq!(
            serde_json::to_value(ChunkData::Raw("x".into())).unwrap(),
            json!({"format": "raw", "value": "x"})
        );
    }

    #[test]
    fn test_stream_chunk_serializes_with_type_tag() {
        let value = serde_json::to_value(StreamChunk::MessageId("m1".into())).unwrap();
        assert_eq!(value, json!({"type": "message_id", "value": "m1"}));
    }
}
