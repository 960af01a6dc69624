use std::sync::Arc;

use super::mcp_server::McpServer;
use crate::model::ModelSettings;

pub const DEFAULT_MAX_TURNS: u32 = 10;

/// Instructions, tool sources and model settings for one assistant.
pub struct Agent {
    pub name: String,
    pub instructions: String,
    pub mcp_servers: Vec<Arc<McpServer>>,
    pub model_settings: ModelSettings,
    pub max_turns: u32,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model_settings: ModelSettings,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            mcp_servers: Vec::new(),
            model_settings,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_mcp_server(mut self, server: Arc<McpServer>) -> Self {
        self.mcp_servers.push(server);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}
