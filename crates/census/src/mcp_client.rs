//! MCP client for the Census tool server.

use std::collections::HashMap;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientInfo, Implementation, InitializeResult,
    JsonObject, LoggingLevel, LoggingMessageNotificationParam, Tool,
};
use rmcp::service::{ClientInitializeError, NotificationContext, RunningService};
use rmcp::transport::{IntoTransport, TokioChildProcess};
use rmcp::{ClientHandler, Peer, RoleClient, ServiceError, ServiceExt};
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::subprocess::configure_subprocess;

#[derive(Error, Debug)]
pub enum McpClientError {
    #[error("Failed to launch MCP server '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MCP handshake failed: {0}")]
    Initialize(#[from] ClientInitializeError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("MCP server did not report its capabilities")]
    MissingServerInfo,
}

/// The operations the CLI and the agent need from an MCP session.
#[async_trait::async_trait]
pub trait McpClientTrait: Send + Sync {
    /// Result of the initialization handshake, available once connected.
    fn get_info(&self) -> Option<&InitializeResult>;

    async fn list_tools(&self) -> Result<Vec<Tool>, McpClientError>;

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpClientError>;

    /// Ends the session and releases the transport. Calling it twice is a no-op.
    async fn shutdown(&self);
}

/// Opens MCP sessions. Split out from the client so callers can be handed a
/// fake transport.
#[async_trait::async_trait]
pub trait McpConnector: Send + Sync {
    async fn connect(
        &self,
        params: &StdioServerParams,
    ) -> Result<Box<dyn McpClientTrait>, McpClientError>;
}

/// How to launch a stdio MCP server. The child inherits our environment;
/// `envs` is layered on top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StdioServerParams {
    pub command: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
}

impl StdioServerParams {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CensusClient;

impl ClientHandler for CensusClient {
    async fn on_logging_message(
        &self,
        params: LoggingMessageNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        let logger = params.logger.as_deref().unwrap_or("server");
        match params.level {
            LoggingLevel::Debug => debug!(logger, data = %params.data, "mcp server log"),
            LoggingLevel::Info | LoggingLevel::Notice => {
                info!(logger, data = %params.data, "mcp server log")
            }
            _ => warn!(logger, level = ?params.level, data = %params.data, "mcp server log"),
        }
    }

    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            client_info: Implementation {
                name: "census".to_string(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

pub struct McpClient {
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, CensusClient>>>,
    server_info: Option<InitializeResult>,
}

impl McpClient {
    /// Runs the initialization handshake over `transport`.
    pub async fn connect<T, E, A>(transport: T) -> Result<Self, McpClientError>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + From<std::io::Error> + Send + Sync + 'static,
    {
        let service = CensusClient.serve(transport).await?;
        let server_info = service.peer_info().cloned();
        if let Some(info) = &server_info {
            info!(
                server = %info.server_info.name,
                version = %info.server_info.version,
                protocol = ?info.protocol_version,
                "mcp session initialized"
            );
        }

        Ok(Self {
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            server_info,
        })
    }
}

#[async_trait::async_trait]
impl McpClientTrait for McpClient {
    fn get_info(&self) -> Option<&InitializeResult> {
        self.server_info.as_ref()
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, McpClientError> {
        let tools = self.peer.list_all_tools().await?;
        debug!(count = tools.len(), "listed mcp tools");
        Ok(tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpClientError> {
        debug!(tool = name, "calling mcp tool");
        let result = self
            .peer
            .call_tool(CallToolRequestParams {
                meta: None,
                task: None,
                name: name.to_string().into(),
                arguments,
            })
            .await?;
        Ok(result)
    }

    async fn shutdown(&self) {
        let Some(service) = self.service.lock().await.take() else {
            return;
        };
        match service.cancel().await {
            Ok(reason) => debug!(?reason, "mcp session closed"),
            Err(e) => warn!("MCP session did not shut down cleanly: {}", e),
        }
    }
}

/// Launches the server as a child process and talks MCP over its stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioConnector;

#[async_trait::async_trait]
impl McpConnector for StdioConnector {
    async fn connect(
        &self,
        params: &StdioServerParams,
    ) -> Result<Box<dyn McpClientTrait>, McpClientError> {
        let mut command = Command::new(&params.command);
        command.args(&params.args).envs(&params.envs);
        configure_subprocess(&mut command);

        let transport = TokioChildProcess::new(command).map_err(|source| McpClientError::Spawn {
            command: params.command.clone(),
            source,
        })?;
        info!(command = %params.command, args = ?params.args, "launched mcp server");

        let client = McpClient::connect(transport).await?;
        Ok(Box::new(client))
    }
}
