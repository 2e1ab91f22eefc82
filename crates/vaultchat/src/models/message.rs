use super::role::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool invocation as the chat UI tracks it: the call plus its result once available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub state: String,
    pub tool_call_id: String,
    pub tool_name: String,
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
/// Structured piece of a message, kept in order alongside the flat `content` text
pub enum MessagePart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolInvocation {
        tool_invocation: ToolInvocation,
    },
}

impl MessagePart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessagePart::Text { text: text.into() }
    }

    pub fn tool_invocation(tool_invocation: ToolInvocation) -> Self {
        MessagePart::ToolInvocation { tool_invocation }
    }

    pub fn as_tool_invocation(&self) -> Option<&ToolInvocation> {
        match self {
            MessagePart::ToolInvocation { tool_invocation } => Some(tool_invocation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message in the conversation history the caller sends with each request
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<MessagePart>>,
}

impl ChatMessage {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        ChatMessage {
            role,
            content: content.into(),
            name: None,
            parts: None,
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    pub fn tool<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Tool, content)
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a part, creating the parts list on first use
    pub fn with_part(mut self, part: MessagePart) -> Self {
        self.parts.get_or_insert_with(Vec::new).push(part);
        self
    }

    pub fn tool_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts
            .iter()
            .flatten()
            .filter_map(MessagePart::as_tool_invocation)
    }
}
