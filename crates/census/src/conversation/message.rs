use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};

/// A function call requested by the model. `arguments` is the raw JSON text
/// the model produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parses the arguments as a JSON object. Empty text means no arguments.
    pub fn parsed_arguments(&self) -> Result<Option<JsonObject>, serde_json::Error> {
        if self.arguments.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<JsonObject>(&self.arguments).map(Some)
    }
}

/// One entry of the conversation sent to the model. The system prompt is
/// passed separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User {
        text: String,
    },
    Assistant {
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Message::Assistant {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            text: None,
            tool_calls,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Message::User { text } => Some(text.as_str()),
            Message::Assistant { text, .. } => text.as_deref(),
            Message::Tool { content, .. } => Some(content.as_str()),
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}
