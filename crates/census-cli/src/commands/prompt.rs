use std::io::Write;

use anyhow::Result;
use census::providers::base::Provider;
use census::providers::openai::OPEN_AI_DEFAULT_MODEL;
use tracing::info;

pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant";
pub const DEFAULT_QUESTION: &str = "According to Census 2020 what is the population of Maryland?";

#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub model: String,
    pub instructions: String,
    pub question: String,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            model: OPEN_AI_DEFAULT_MODEL.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            question: DEFAULT_QUESTION.to_string(),
        }
    }
}

/// Sends one question straight to the model, no tools attached.
pub async fn handle_prompt<W: Write>(
    provider: &dyn Provider,
    opts: &PromptOptions,
    out: &mut W,
) -> Result<()> {
    info!(provider = provider.get_name(), model = %opts.model, "sending prompt");
    let answer = provider
        .generate(&opts.model, &opts.instructions, &opts.question)
        .await?;
    writeln!(out, "{}", answer)?;
    Ok(())
}
