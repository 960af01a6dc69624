use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether the model may, must, or must not call tools on a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    Required,
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
            ToolChoice::None => "none",
        }
    }
}

impl fmt::Display for ToolChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ToolChoice::Auto),
            "required" => Ok(ToolChoice::Required),
            "none" => Ok(ToolChoice::None),
            other => Err(format!(
                "unknown tool choice '{}', expected auto, required or none",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub model: String,
    #[serde(default)]
    pub tool_choice: ToolChoice,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            tool_choice: ToolChoice::default(),
        }
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("auto", ToolChoice::Auto)]
    #[test_case("REQUIRED", ToolChoice::Required)]
    #[test_case("none", ToolChoice::None)]
    fn tool_choice_parses(input: &str, expected: ToolChoice) {
        assert_eq!(input.parse::<ToolChoice>().unwrap(), expected);
        assert_eq!(expected.to_string(), input.to_ascii_lowercase());
    }

    #[test]
    fn unknown_tool_choice_is_rejected() {
        assert!("sometimes".parse::<ToolChoice>().is_err());
    }

    #[test]
    fn settings_default_to_auto() {
        let settings = ModelSettings::new("gpt-4.1-mini");
        assert_eq!(settings.tool_choice, ToolChoice::Auto);
    }
}
