use rmcp::model::{CallToolResult, JsonObject, Tool};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::mcp_client::{McpClientError, McpClientTrait, McpConnector, StdioServerParams};

/// A connected MCP server used as an agent tool source.
///
/// With `cache_tools_list` set, the tool list is fetched from the server on
/// first use and served from memory afterwards.
pub struct McpServer {
    name: String,
    client: Box<dyn McpClientTrait>,
    cache_tools_list: bool,
    tools_cache: Mutex<Option<Vec<Tool>>>,
}

impl McpServer {
    pub fn new(
        name: impl Into<String>,
        client: Box<dyn McpClientTrait>,
        cache_tools_list: bool,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            cache_tools_list,
            tools_cache: Mutex::new(None),
        }
    }

    pub async fn connect(
        name: impl Into<String>,
        connector: &dyn McpConnector,
        params: &StdioServerParams,
        cache_tools_list: bool,
    ) -> Result<Self, McpClientError> {
        let name = name.into();
        let client = connector.connect(params).await?;
        info!(server = %name, cache_tools_list, "mcp server connected");
        Ok(Self::new(name, client, cache_tools_list))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpClientError> {
        if !self.cache_tools_list {
            return self.client.list_tools().await;
        }

        let mut cache = self.tools_cache.lock().await;
        if let Some(tools) = cache.as_ref() {
            return Ok(tools.clone());
        }
        let tools = self.client.list_tools().await?;
        debug!(server = %self.name, count = tools.len(), "cached tool list");
        *cache = Some(tools.clone());
        Ok(tools)
    }

    /// Forces the next `list_tools` to go back to the server.
    pub async fn invalidate_tools_cache(&self) {
        *self.tools_cache.lock().await = None;
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpClientError> {
        self.client.call_tool(name, arguments).await
    }

    pub async fn cleanup(&self) {
        info!(server = %self.name, "shutting down mcp server");
        self.client.shutdown().await;
    }
}
