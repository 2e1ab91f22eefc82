use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A tool call requested by the remote agent, as carried by a `9:` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tool_call_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
    /// Fields the payload carried beyond the ones above
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ToolCall {
    pub fn new<I, N>(tool_call_id: I, tool_name: N, args: Value) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            args,
            extra: Map::new(),
        }
    }

    /// Lift a `9:` payload of any shape. An object keeps all its fields; anything else
    /// becomes the arguments of a call with an empty id and name.
    pub fn from_payload(payload: Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_else(|_| Self::new("", "", payload))
    }
}

/// The outcome of a tool call, correlated by `tool_call_id`, as carried by an `a:` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tool_call_id: String,
    #[serde(default)]
    pub result: Value,
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ToolResult {
    pub fn new<I: Into<String>>(tool_call_id: I, result: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            result,
            extra: Map::new(),
        }
    }

    /// Lift an `a:` payload of any shape; a non-object payload becomes the result itself
    pub fn from_payload(payload: Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_else(|_| Self::new("", payload))
    }
}

/// Ids and names arrive as strings, but numbers are accepted and `null` reads as empty
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
