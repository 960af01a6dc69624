use std::collections::HashMap;

use rmcp::model::{CallToolResult, Tool};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::agent::Agent;
use crate::conversation::message::{Message, ToolCall};
use crate::mcp_client::McpClientError;
use crate::mcp_utils::{is_error, text_items};
use crate::providers::base::Provider;
use crate::providers::errors::ProviderError;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Mcp(#[from] McpClientError),

    #[error("Model called unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Model sent invalid arguments for tool '{tool}': {source}")]
    InvalidToolArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tool '{0}' is exposed by more than one MCP server")]
    DuplicateTool(String),

    #[error("Agent run exceeded {0} turns without a final answer")]
    MaxTurnsExceeded(u32),

    #[error("Model returned neither text nor tool calls")]
    EmptyResponse,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub final_output: String,
    /// Model calls made, including the one that produced the answer.
    pub turns: u32,
    /// Full conversation, starting with the user input.
    pub messages: Vec<Message>,
}

/// Drives an agent through model calls and tool calls until it answers.
pub struct Runner;

impl Runner {
    #[instrument(skip_all, fields(agent = %agent.name, model = %agent.model_settings.model))]
    pub async fn run(
        agent: &Agent,
        provider: &dyn Provider,
        input: &str,
    ) -> Result<RunResult, AgentError> {
        let mut messages = vec![Message::user(input)];

        for turn in 1..=agent.max_turns {
            let (tools, routes) = collect_tools(agent).await?;
            debug!(turn, tools = tools.len(), "requesting model turn");

            let response = provider
                .complete(
                    &agent.model_settings,
                    &agent.instructions,
                    &messages,
                    &tools,
                )
                .await?;
            let tool_calls = response.tool_calls().to_vec();
            let final_output = response.text().map(str::to_string);
            messages.push(response);

            if tool_calls.is_empty() {
                let final_output = final_output.ok_or(AgentError::EmptyResponse)?;
                info!(turn, "agent produced final output");
                return Ok(RunResult {
                    final_output,
                    turns: turn,
                    messages,
                });
            }

            for call in tool_calls {
                let output = dispatch_tool_call(agent, &routes, &call).await?;
                messages.push(Message::tool_result(call.id, output));
            }
        }

        Err(AgentError::MaxTurnsExceeded(agent.max_turns))
    }
}

/// All tools across the agent's servers, plus tool name -> server index.
async fn collect_tools(agent: &Agent) -> Result<(Vec<Tool>, HashMap<String, usize>), AgentError> {
    let mut tools = Vec::new();
    let mut routes = HashMap::new();

    for (index, server) in agent.mcp_servers.iter().enumerate() {
        for tool in server.list_tools().await? {
            if routes.insert(tool.name.to_string(), index).is_some() {
                return Err(AgentError::DuplicateTool(tool.name.to_string()));
            }
            tools.push(tool);
        }
    }

    Ok((tools, routes))
}

async fn dispatch_tool_call(
    agent: &Agent,
    routes: &HashMap<String, usize>,
    call: &ToolCall,
) -> Result<String, AgentError> {
    let server = routes
        .get(&call.name)
        .and_then(|index| agent.mcp_servers.get(*index))
        .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;

    let arguments = call
        .parsed_arguments()
        .map_err(|source| AgentError::InvalidToolArguments {
            tool: call.name.clone(),
            source,
        })?;

    info!(tool = %call.name, server = %server.name(), "dispatching tool call");
    let result = server.call_tool(&call.name, arguments).await?;
    if is_error(&result) {
        warn!(tool = %call.name, "tool reported an error");
    }

    Ok(render_tool_result(&result))
}

/// What the model sees as a tool's output: the text items joined by
/// newlines, or the raw content JSON when there is no text.
fn render_tool_result(result: &CallToolResult) -> String {
    let text = text_items(result).join("\n");
    let body = if text.is_empty() && !result.content.is_empty() {
        match serde_json::to_string(&result.content) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize non-text tool output: {}", e);
                String::new()
            }
        }
    } else {
        text
    };

    if is_error(result) {
        format!("Error: {}", body)
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    #[test]
    fn tool_output_joins_text_items() {
        let result = CallToolResult::success(vec![
            Content::text("NAME,B01003_001E"),
            Content::text("Maryland,6180253"),
        ]);
        assert_eq!(render_tool_result(&result), "NAME,B01003_001E\nMaryland,6180253");
    }

    #[test]
    fn tool_errors_are_labelled() {
        let result = CallToolResult::error(vec![Content::text("unknown variable")]);
        assert_eq!(render_tool_result(&result), "Error: unknown variable");
    }

    #[test]
    fn non_text_output_falls_back_to_json() {
        let result = CallToolResult::success(vec![Content::image("aGk=", "image/png")]);
        let rendered = render_tool_result(&result);
        assert!(rendered.contains("image/png"), "{}", rendered);
    }
}
