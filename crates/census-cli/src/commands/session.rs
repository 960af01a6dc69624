use std::future::Future;
use std::io::Write;

use anyhow::Result;
use census::config::CensusConfig;
use census::mcp_client::{McpClientError, McpClientTrait, McpConnector};
use census::mcp_utils::text_items;
use census::tools::{FetchAggregateDataArgs, Geography, FETCH_AGGREGATE_DATA_TOOL};
use tracing::{info, warn};

use crate::signal::Interrupted;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub tool: String,
    pub arguments: FetchAggregateDataArgs,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tool: FETCH_AGGREGATE_DATA_TOOL.to_string(),
            arguments: FetchAggregateDataArgs::default(),
        }
    }
}

impl SessionOptions {
    pub fn new(
        tool: impl Into<String>,
        year: u32,
        dataset: impl Into<String>,
        geography: Geography,
        variables: Vec<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            arguments: FetchAggregateDataArgs {
                year,
                dataset: dataset.into(),
                geography,
                variables,
            },
        }
    }
}

/// Drives the Census MCP server by hand: handshake, tool listing, one call.
///
/// If `interrupt` resolves first, the session is shut down and
/// [`Interrupted`] is returned.
pub async fn handle_session<W, F>(
    connector: &dyn McpConnector,
    opts: &SessionOptions,
    out: &mut W,
    interrupt: F,
) -> Result<()>
where
    W: Write,
    F: Future<Output = ()>,
{
    let config = CensusConfig::from_env()?;
    tokio::pin!(interrupt);

    // Dropping a pending connect drops the child, which kills it.
    let server_params = config.server_params();
    let client = tokio::select! {
        client = connector.connect(&server_params) => client?,
        _ = &mut interrupt => return Err(Interrupted.into()),
    };

    let result = tokio::select! {
        result = run_session(client.as_ref(), opts, out) => result,
        _ = &mut interrupt => {
            warn!("interrupted, shutting down mcp session");
            Err(Interrupted.into())
        }
    };
    client.shutdown().await;
    result
}

async fn run_session<W: Write>(
    client: &dyn McpClientTrait,
    opts: &SessionOptions,
    out: &mut W,
) -> Result<()> {
    let info = client.get_info().ok_or(McpClientError::MissingServerInfo)?;
    writeln!(
        out,
        "Initialized MCP session, capabilities: {}",
        serde_json::to_string(&info.capabilities)?
    )?;

    let tools = client.list_tools().await?;
    writeln!(out, "Available tools from Census MCP:")?;
    for tool in &tools {
        writeln!(
            out,
            "- {}: {}",
            tool.name,
            tool.description.as_deref().unwrap_or_default()
        )?;
    }

    let arguments = opts.arguments.to_arguments()?;
    writeln!(
        out,
        "\nCalling tool {} with:\n{}",
        opts.tool,
        serde_json::to_string_pretty(&arguments)?
    )?;

    let result = client.call_tool(&opts.tool, Some(arguments)).await?;
    info!(tool = %opts.tool, items = result.content.len(), "tool call returned");

    writeln!(out, "\nTool result content:")?;
    for text in text_items(&result) {
        writeln!(out, "{}", text)?;
    }
    Ok(())
}
