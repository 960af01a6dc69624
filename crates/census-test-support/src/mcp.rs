use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use census::config::CENSUS_API_KEY;
use census::mcp_client::{McpClientError, McpClientTrait, McpConnector, StdioServerParams};
use census::tools::{FetchAggregateDataArgs, FETCH_AGGREGATE_DATA_TOOL};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, InitializeResult, JsonObject, ServerCapabilities,
    ServerInfo, Tool,
};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceError};
use tokio::sync::Notify;

pub const FIXTURE_SERVER_NAME: &str = "census-fixture";
/// Maryland, ACS 5-year 2023, B01003_001E.
pub const FIXTURE_POPULATION: &str = "6180253";

/// 1x1 transparent PNG.
const CHART_PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

pub fn fixture_server_info() -> ServerInfo {
    ServerInfo {
        capabilities: ServerCapabilities::builder().enable_tools().build(),
        server_info: Implementation {
            name: FIXTURE_SERVER_NAME.into(),
            version: "1.0.0".into(),
            ..Default::default()
        },
        instructions: Some("Census fixture with fetch-aggregate-data and list-datasets.".into()),
        ..Default::default()
    }
}

/// Stdio MCP server standing in for the real Census server in tests.
#[derive(Clone)]
pub struct CensusFixtureServer {
    tool_router: ToolRouter<CensusFixtureServer>,
}

impl Default for CensusFixtureServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl CensusFixtureServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "fetch-aggregate-data",
        description = "Fetch aggregate Census data for a geography"
    )]
    fn fetch_aggregate_data(
        &self,
        Parameters(args): Parameters<FetchAggregateDataArgs>,
    ) -> Result<CallToolResult, McpError> {
        let has_key = std::env::var(CENSUS_API_KEY)
            .map(|key| !key.is_empty())
            .unwrap_or(false);
        if !has_key {
            return Ok(CallToolResult::error(vec![Content::text(format!(
                "{} is not set for the server process",
                CENSUS_API_KEY
            ))]));
        }

        let values: Vec<&str> = args
            .variables
            .iter()
            .map(|variable| match (args.geography.fips.as_str(), variable.as_str()) {
                ("24", "B01003_001E") => FIXTURE_POPULATION,
                _ => "0",
            })
            .collect();
        let table = format!(
            "NAME,{}\n{} {},{}",
            args.variables.join(","),
            args.geography.kind,
            args.geography.fips,
            values.join(",")
        );

        Ok(CallToolResult::success(vec![
            Content::text(format!("{} {} results", args.year, args.dataset)),
            Content::image(CHART_PNG_B64, "image/png"),
            Content::text(table),
        ]))
    }

    #[tool(name = "list-datasets", description = "List the datasets the server can query")]
    fn list_datasets(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(
            "acs/acs1\nacs/acs5\ndec/pl",
        )]))
    }
}

#[tool_handler]
impl ServerHandler for CensusFixtureServer {
    fn get_info(&self) -> ServerInfo {
        fixture_server_info()
    }
}

/// Counters shared between a fake client, its connector and the test.
#[derive(Debug, Default)]
pub struct McpCallLog {
    connects: AtomicUsize,
    list_tools: AtomicUsize,
    shutdowns: AtomicUsize,
    tool_calls: Mutex<Vec<(String, Option<JsonObject>)>>,
    hung: Notify,
}

impl McpCallLog {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn list_tools_calls(&self) -> usize {
        self.list_tools.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn tool_calls(&self) -> Vec<(String, Option<JsonObject>)> {
        self.tool_calls.lock().unwrap().clone()
    }

    /// Resolves once a call to a hanging tool is in flight.
    pub async fn wait_for_hung_call(&self) {
        self.hung.notified().await;
    }
}

/// In-memory `McpClientTrait` with canned tools and results. Calling a tool
/// without a canned result fails the way a server rejects an unknown tool.
#[derive(Clone)]
pub struct FakeMcpClient {
    info: InitializeResult,
    tools: Vec<Tool>,
    results: HashMap<String, CallToolResult>,
    broken_tools: Vec<String>,
    hanging_tools: Vec<String>,
    log: Arc<McpCallLog>,
}

impl Default for FakeMcpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMcpClient {
    pub fn new() -> Self {
        Self {
            info: fixture_server_info(),
            tools: Vec::new(),
            results: HashMap::new(),
            broken_tools: Vec::new(),
            hanging_tools: Vec::new(),
            log: Arc::new(McpCallLog::default()),
        }
    }

    /// A client exposing `fetch-aggregate-data` that answers with `text`.
    pub fn census(text: &str) -> Self {
        Self::new()
            .with_tool(FETCH_AGGREGATE_DATA_TOOL, "Fetch aggregate Census data")
            .with_result(
                FETCH_AGGREGATE_DATA_TOOL,
                CallToolResult::success(vec![Content::text(text.to_string())]),
            )
    }

    pub fn with_tool(mut self, name: &str, description: &str) -> Self {
        let schema = serde_json::json!({"type": "object", "properties": {}});
        let schema = schema.as_object().cloned().unwrap_or_default();
        self.tools.push(Tool::new(
            name.to_string(),
            description.to_string(),
            Arc::new(schema),
        ));
        self
    }

    pub fn with_result(mut self, name: &str, result: CallToolResult) -> Self {
        self.results.insert(name.to_string(), result);
        self
    }

    /// Calls to `name` fail as if the transport dropped mid-request.
    pub fn with_broken_tool(mut self, name: &str) -> Self {
        self.broken_tools.push(name.to_string());
        self
    }

    /// Calls to `name` never return, like a server that stopped answering.
    pub fn with_hanging_tool(mut self, name: &str) -> Self {
        self.hanging_tools.push(name.to_string());
        self
    }

    pub fn log(&self) -> Arc<McpCallLog> {
        self.log.clone()
    }
}

#[async_trait::async_trait]
impl McpClientTrait for FakeMcpClient {
    fn get_info(&self) -> Option<&InitializeResult> {
        Some(&self.info)
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, McpClientError> {
        self.log.list_tools.fetch_add(1, Ordering::SeqCst);
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpClientError> {
        self.log
            .tool_calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));

        if self.hanging_tools.iter().any(|t| t == name) {
            self.log.hung.notify_one();
            return std::future::pending().await;
        }
        if self.broken_tools.iter().any(|t| t == name) {
            return Err(ServiceError::TransportClosed.into());
        }
        self.results.get(name).cloned().ok_or_else(|| {
            ServiceError::McpError(McpError::invalid_params(
                format!("tool '{}' not found", name),
                None,
            ))
            .into()
        })
    }

    async fn shutdown(&self) {
        self.log.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out clones of one `FakeMcpClient`, recording every connect.
pub struct FakeConnector {
    client: FakeMcpClient,
    params: Mutex<Vec<StdioServerParams>>,
}

impl FakeConnector {
    pub fn new(client: FakeMcpClient) -> Self {
        Self {
            client,
            params: Mutex::new(Vec::new()),
        }
    }

    pub fn log(&self) -> Arc<McpCallLog> {
        self.client.log()
    }

    pub fn connected_with(&self) -> Vec<StdioServerParams> {
        self.params.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl McpConnector for FakeConnector {
    async fn connect(
        &self,
        params: &StdioServerParams,
    ) -> Result<Box<dyn McpClientTrait>, McpClientError> {
        self.client.log.connects.fetch_add(1, Ordering::SeqCst);
        self.params.lock().unwrap().push(params.clone());
        Ok(Box::new(self.client.clone()))
    }
}
