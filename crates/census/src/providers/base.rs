use rmcp::model::Tool;

use super::errors::ProviderError;
use crate::conversation::message::Message;
use crate::model::ModelSettings;

/// An LLM backend.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn get_name(&self) -> &str;

    /// One-shot text generation: fixed instructions, one user input, text out.
    async fn generate(
        &self,
        model: &str,
        instructions: &str,
        input: &str,
    ) -> Result<String, ProviderError>;

    /// One model turn over a conversation with tools available. The returned
    /// message is either a final answer or a batch of tool calls.
    async fn complete(
        &self,
        settings: &ModelSettings,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Message, ProviderError>;
}
