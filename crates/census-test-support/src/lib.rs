pub mod mcp;
pub mod provider;

pub use mcp::{
    fixture_server_info, CensusFixtureServer, FakeConnector, FakeMcpClient, McpCallLog,
    FIXTURE_POPULATION, FIXTURE_SERVER_NAME,
};
pub use provider::{CompletionRequest, ScriptedProvider};
