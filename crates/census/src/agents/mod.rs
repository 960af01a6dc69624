mod agent;
pub mod mcp_server;
mod runner;

pub use agent::{Agent, DEFAULT_MAX_TURNS};
pub use mcp_server::McpServer;
pub use runner::{AgentError, RunResult, Runner};
