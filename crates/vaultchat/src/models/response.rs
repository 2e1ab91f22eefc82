use super::chunk::Usage;
use super::message::{ChatMessage, MessagePart, ToolInvocation};
use super::tool::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything a single streamed reply carried, folded into one value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResponse {
    pub content: String,
    pub message_id: Option<String>,
    pub usage: Option<Usage>,
    pub path_info: Option<Value>,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
}

impl ProcessedResponse {
    /// First result correlated with `tool_call_id`, in arrival order
    pub fn result_for(&self, tool_call_id: &str) -> Option<&ToolResult> {
        self.tool_results
            .iter()
            .find(|result| result.tool_call_id == tool_call_id)
    }

    /// Tool calls the endpoint asked for but did not report a result for
    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        self.tool_calls
            .iter()
            .filter(|call| self.result_for(&call.tool_call_id).is_none())
            .collect()
    }

    /// Convert into an assistant message the caller can append to its history
    pub fn to_message(&self) -> ChatMessage {
        let mut message = ChatMessage::assistant(self.content.clone());
        if !self.content.is_empty() {
            message = message.with_part(MessagePart::text(self.content.clone()));
        }
        for call in &self.tool_calls {
            let result = self.result_for(&call.tool_call_id).map(|r| r.result.clone());
            let state = if result.is_some() { "result" } else { "call" };
            message = message.with_part(MessagePart::tool_invocation(ToolInvocation {
                state: state.to_string(),
                tool_call_id: call.tool_call_id.clone(),
                tool_name: call.tool_name.clone(),
                args: call.args.clone(),
                result,
            }));
        }
        message
    }
}
