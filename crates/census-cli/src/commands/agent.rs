use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use census::agents::{Agent, McpServer, Runner, DEFAULT_MAX_TURNS};
use census::config::CensusConfig;
use census::mcp_client::McpConnector;
use census::model::{ModelSettings, ToolChoice};
use census::providers::base::Provider;
use census::providers::openai::OPEN_AI_DEFAULT_AGENT_MODEL;
use tracing::{info, warn};

use crate::signal::Interrupted;

pub const CENSUS_SERVER_NAME: &str = "Census MCP";
pub const AGENT_NAME: &str = "Census Assistant";
pub const DEFAULT_INSTRUCTIONS: &str =
    "Use the Census MCP tools to answer questions about U.S. population and demographics.";
pub const DEFAULT_QUESTION: &str = "What is the income distribution for FIPS code 24031?";

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub model: String,
    pub tool_choice: ToolChoice,
    pub instructions: String,
    pub question: String,
    pub max_turns: u32,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: OPEN_AI_DEFAULT_AGENT_MODEL.to_string(),
            tool_choice: ToolChoice::Auto,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            question: DEFAULT_QUESTION.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

/// Runs one question through an agent backed by the Census MCP server. The
/// server is shut down before returning, whether the run succeeded, failed or
/// was cut short by `interrupt`.
pub async fn handle_agent<W, F>(
    connector: &dyn McpConnector,
    provider: &dyn Provider,
    opts: &AgentOptions,
    out: &mut W,
    interrupt: F,
) -> Result<()>
where
    W: Write,
    F: Future<Output = ()>,
{
    let config = CensusConfig::from_env()?;
    tokio::pin!(interrupt);

    let server_params = config.server_params();
    let server = tokio::select! {
        server = McpServer::connect(CENSUS_SERVER_NAME, connector, &server_params, true) => {
            Arc::new(server?)
        }
        _ = &mut interrupt => return Err(Interrupted.into()),
    };

    let agent = Agent::new(
        AGENT_NAME,
        opts.instructions.clone(),
        ModelSettings::new(opts.model.clone()).with_tool_choice(opts.tool_choice),
    )
    .with_mcp_server(server.clone())
    .with_max_turns(opts.max_turns);

    let result = tokio::select! {
        result = Runner::run(&agent, provider, &opts.question) => result.map_err(anyhow::Error::from),
        _ = &mut interrupt => {
            warn!("interrupted, shutting down mcp server");
            Err(Interrupted.into())
        }
    };
    server.cleanup().await;

    let result = result?;
    info!(turns = result.turns, "agent run finished");
    writeln!(out, "{}", result.final_output)?;
    Ok(())
}
