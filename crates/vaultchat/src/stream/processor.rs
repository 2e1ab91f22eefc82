use futures::future;
use futures::stream::StreamExt;
use serde_json::Value;
use strum_macros::EnumIter;

use super::ChunkStream;
use crate::models::chunk::{ChunkData, Finish, RawChunk, StreamChunk, Usage};
use crate::models::tool::{ToolCall, ToolResult};

/// Line prefixes the endpoint is known to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Prefix {
    Text,
    ToolCall,
    ToolResult,
    MessageId,
    FinishStep,
    FinishMessage,
    PathInfo,
}

impl Prefix {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Prefix::Text),
            '9' => Some(Prefix::ToolCall),
            'a' => Some(Prefix::ToolResult),
            'f' => Some(Prefix::MessageId),
            'e' => Some(Prefix::FinishStep),
            'd' => Some(Prefix::FinishMessage),
            '2' => Some(Prefix::PathInfo),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Prefix::Text => '0',
            Prefix::ToolCall => '9',
            Prefix::ToolResult => 'a',
            Prefix::MessageId => 'f',
            Prefix::FinishStep => 'e',
            Prefix::FinishMessage => 'd',
            Prefix::PathInfo => '2',
        }
    }
}

/// Lift one raw chunk into its semantic event.
///
/// Returns `None` only for a message-id line without a `messageId` field.
pub fn process(raw: RawChunk) -> Option<StreamChunk> {
    let Some(prefix) = Prefix::from_char(raw.prefix) else {
        tracing::debug!(prefix = %raw.prefix, "Passing through unrecognized chunk");
        return Some(StreamChunk::Unknown(raw));
    };

    match prefix {
        Prefix::Text => Some(StreamChunk::Text(text_value(&raw.data))),
        Prefix::ToolCall => Some(StreamChunk::ToolCall(ToolCall::from_payload(
            tool_payload(&raw),
        ))),
        Prefix::ToolResult => Some(StreamChunk::ToolResult(ToolResult::from_payload(
            tool_payload(&raw),
        ))),
        Prefix::MessageId => message_id(&raw.data).map(StreamChunk::MessageId),
        // Both prefixes finish the reply; the endpoint attaches no distinct meaning to `d`
        Prefix::FinishStep | Prefix::FinishMessage => {
            Some(StreamChunk::Finish(finish_value(&raw.data)))
        }
        Prefix::PathInfo => Some(StreamChunk::PathInfo(path_info_value(raw.data))),
    }
}

pub fn process_stream(chunks: ChunkStream<RawChunk>) -> ChunkStream<StreamChunk> {
    chunks
        .filter_map(|chunk| {
            future::ready(match chunk {
                Ok(raw) => process(raw).map(Ok),
                Err(err) => Some(Err(err)),
            })
        })
        .boxed()
}

fn text_value(data: &ChunkData) -> String {
    match data.as_str() {
        Some(text) => text.to_string(),
        None => data.as_json().map(Value::to_string).unwrap_or_default(),
    }
}

fn tool_payload(raw: &RawChunk) -> Value {
    match &raw.data {
        ChunkData::Json(value @ Value::Object(_)) => value.clone(),
        ChunkData::Json(value) => {
            tracing::warn!(raw = %raw.raw, "Tool payload is not an object");
            value.clone()
        }
        ChunkData::Raw(text) => {
            tracing::warn!(raw = %raw.raw, "Tool payload is not valid JSON");
            Value::String(text.clone())
        }
    }
}

fn message_id(data: &ChunkData) -> Option<String> {
    match data.get("messageId")? {
        Value::Null => None,
        Value::String(id) => Some(id.clone()),
        other => Some(other.to_string()),
    }
}

fn finish_value(data: &ChunkData) -> Finish {
    let reason = data
        .get("finishReason")
        .and_then(Value::as_str)
        .unwrap_or("stop")
        .to_string();

    let usage = data
        .get("usage")
        .filter(|usage| !usage.is_null())
        .cloned()
        .map(Usage::from);

    Finish { reason, usage }
}

fn path_info_value(data: ChunkData) -> Value {
    match data {
        ChunkData::Json(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
        ChunkData::Json(value) => value,
        ChunkData::Raw(text) => Value::String(text),
    }
}
