//! Request and response shapes for the OpenAI Chat Completions and
//! Responses endpoints.

use rmcp::model::Tool;
use serde_json::{json, Value};

use crate::conversation::message::{Message, ToolCall};
use crate::model::{ModelSettings, ToolChoice};
use crate::providers::errors::ProviderError;

pub fn format_messages(system: &str, messages: &[Message]) -> Vec<Value> {
    let mut formatted = vec![json!({"role": "system", "content": system})];

    for message in messages {
        let value = match message {
            Message::User { text } => json!({"role": "user", "content": text}),
            Message::Assistant { text, tool_calls } => {
                let mut value = json!({"role": "assistant", "content": text});
                if !tool_calls.is_empty() {
                    value["tool_calls"] = tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments,
                                }
                            })
                        })
                        .collect();
                }
                value
            }
            Message::Tool {
                tool_call_id,
                content,
            } => json!({"role": "tool", "tool_call_id": tool_call_id, "content": content}),
        };
        formatted.push(value);
    }

    formatted
}

pub fn format_tools(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description.as_deref().unwrap_or_default(),
                    "parameters": tool.input_schema.as_ref(),
                }
            })
        })
        .collect()
}

/// Chat Completions payload. `tools` and `tool_choice` are omitted when no
/// tools are available, since the endpoint rejects a choice without tools.
pub fn create_request(
    settings: &ModelSettings,
    system: &str,
    messages: &[Message],
    tools: &[Tool],
) -> Value {
    let mut payload = json!({
        "model": settings.model,
        "messages": format_messages(system, messages),
    });

    if !tools.is_empty() {
        payload["tools"] = Value::Array(format_tools(tools));
        payload["tool_choice"] = Value::String(settings.tool_choice.as_str().to_string());
        if settings.tool_choice != ToolChoice::None {
            payload["parallel_tool_calls"] = Value::Bool(false);
        }
    }

    payload
}

pub fn response_to_message(response: &Value) -> Result<Message, ProviderError> {
    let message = response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| {
            ProviderError::InvalidResponse("Response has no choices[0].message".to_string())
        })?;

    let text = message
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
        for call in calls {
            let id = call.get("id").and_then(Value::as_str);
            let function = call.get("function");
            let name = function.and_then(|f| f.get("name")).and_then(Value::as_str);
            let arguments = function
                .and_then(|f| f.get("arguments"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            match (id, name) {
                (Some(id), Some(name)) => tool_calls.push(ToolCall::new(id, name, arguments)),
                _ => {
                    return Err(ProviderError::InvalidResponse(format!(
                        "Malformed tool call: {}",
                        call
                    )))
                }
            }
        }
    }

    // An empty string is a real (empty) answer, but only noise next to tool calls.
    let text = if tool_calls.is_empty() {
        text
    } else {
        text.filter(|t| !t.is_empty())
    };

    Ok(Message::Assistant { text, tool_calls })
}

/// Responses endpoint payload for a single instruction + input exchange.
pub fn create_responses_request(model: &str, instructions: &str, input: &str) -> Value {
    json!({
        "model": model,
        "instructions": instructions,
        "input": input,
    })
}

/// Concatenates the `output_text` parts of all message items, which is what
/// the official SDKs expose as `response.output_text`.
pub fn responses_output_text(response: &Value) -> Result<String, ProviderError> {
    if let Some(text) = response.get("output_text").and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    let output = response
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::InvalidResponse("Response has no output".to_string()))?;

    let text: String = output
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("message"))
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    Ok(text)
}
