use std::env;

use rmcp::model::Tool;

use super::api_client::{ApiClient, AuthMethod};
use super::base::Provider;
use super::errors::ProviderError;
use super::formats::openai::{
    create_request, create_responses_request, response_to_message, responses_output_text,
};
use crate::config::ConfigError;
use crate::conversation::message::Message;
use crate::model::ModelSettings;

pub const OPEN_AI_PROVIDER_NAME: &str = "openai";
pub const OPEN_AI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPEN_AI_HOST: &str = "OPENAI_HOST";
pub const OPEN_AI_DEFAULT_HOST: &str = "https://api.openai.com";
/// Model used for the one-shot prompt.
pub const OPEN_AI_DEFAULT_MODEL: &str = "gpt-5";
/// Tool-calling model used by the agent.
pub const OPEN_AI_DEFAULT_AGENT_MODEL: &str = "gpt-4.1-mini";

const RESPONSES_PATH: &str = "v1/responses";
const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

#[derive(Debug)]
pub struct OpenAiProvider {
    api_client: ApiClient,
}

impl OpenAiProvider {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var(OPEN_AI_API_KEY)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingKey(OPEN_AI_API_KEY))?;
        let host = env::var(OPEN_AI_HOST).unwrap_or_else(|_| OPEN_AI_DEFAULT_HOST.to_string());

        let api_client = ApiClient::new(&host, AuthMethod::BearerToken(api_key)).map_err(|e| {
            ConfigError::InvalidValue {
                key: OPEN_AI_HOST,
                reason: e.to_string(),
            }
        })?;

        Ok(Self::new(api_client))
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    fn get_name(&self) -> &str {
        OPEN_AI_PROVIDER_NAME
    }

    #[tracing::instrument(skip(self, instructions, input), fields(endpoint = "responses"))]
    async fn generate(
        &self,
        model: &str,
        instructions: &str,
        input: &str,
    ) -> Result<String, ProviderError> {
        let payload = create_responses_request(model, instructions, input);
        let response = self.api_client.post_json(RESPONSES_PATH, &payload).await?;
        if let Some(usage) = response.get("usage") {
            tracing::debug!(%usage, "responses usage");
        }
        responses_output_text(&response)
    }

    #[tracing::instrument(
        skip(self, settings, system, messages, tools),
        fields(model = %settings.model, messages = messages.len(), tools = tools.len())
    )]
    async fn complete(
        &self,
        settings: &ModelSettings,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Message, ProviderError> {
        let payload = create_request(settings, system, messages, tools);
        let response = self
            .api_client
            .post_json(CHAT_COMPLETIONS_PATH, &payload)
            .await?;
        if let Some(usage) = response.get("usage") {
            tracing::debug!(%usage, "chat completion usage");
        }
        response_to_message(&response)
    }
}
