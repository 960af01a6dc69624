use std::collections::VecDeque;
use std::sync::Mutex;

use census::conversation::message::Message;
use census::model::{ModelSettings, ToolChoice};
use census::providers::base::Provider;
use census::providers::errors::ProviderError;
use rmcp::model::Tool;

/// What the agent sent on one `complete` call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub tool_choice: ToolChoice,
    pub system: String,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// A provider that replays queued responses in order and records each request.
/// Once the queue is drained it answers with the fallback, or fails if none is set.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Message, ProviderError>>>,
    fallback: Option<String>,
    generated: String,
    requests: Mutex<Vec<CompletionRequest>>,
    prompts: Mutex<Vec<(String, String, String)>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: None,
            generated: String::new(),
            requests: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Keeps returning the same tool-free answer.
    pub fn always_answering(text: &str) -> Self {
        Self {
            fallback: Some(text.to_string()),
            ..Self::new()
        }
    }

    /// Returns `text` from `generate`.
    pub fn generating(text: &str) -> Self {
        Self {
            generated: text.to_string(),
            ..Self::new()
        }
    }

    pub fn then(self, response: Message) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn then_fail(self, error: ProviderError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// (model, instructions, input) for every `generate` call.
    pub fn prompts(&self) -> Vec<(String, String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn get_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        model: &str,
        instructions: &str,
        input: &str,
    ) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push((
            model.to_string(),
            instructions.to_string(),
            input.to_string(),
        ));
        Ok(self.generated.clone())
    }

    async fn complete(
        &self,
        settings: &ModelSettings,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Message, ProviderError> {
        self.requests.lock().unwrap().push(CompletionRequest {
            model: settings.model.clone(),
            tool_choice: settings.tool_choice,
            system: system.to_string(),
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.to_string()).collect(),
        });

        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(text) => Ok(Message::assistant(text.clone())),
            None => Err(ProviderError::InvalidResponse(
                "scripted provider ran out of responses".to_string(),
            )),
        }
    }
}
