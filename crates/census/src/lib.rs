pub mod agents;
pub mod config;
pub mod conversation;
pub mod mcp_client;
pub mod mcp_utils;
pub mod model;
pub mod providers;
pub mod subprocess;
pub mod tools;
