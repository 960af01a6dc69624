use std::collections::HashMap;
use std::env;
use std::fmt;

use thiserror::Error;

use crate::mcp_client::StdioServerParams;

pub const CENSUS_API_KEY: &str = "CENSUS_API_KEY";
pub const CENSUS_MCP_COMMAND: &str = "CENSUS_MCP_COMMAND";
pub const CENSUS_MCP_ARGS: &str = "CENSUS_MCP_ARGS";

/// Launcher script shipped with the Census MCP server checkout, relative to
/// the working directory.
pub const DEFAULT_MCP_COMMAND: &str = "scripts/mcp-connect.sh";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingKey(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Everything needed to launch the Census MCP server over stdio.
#[derive(Clone, PartialEq)]
pub struct CensusConfig {
    pub mcp_command: String,
    pub mcp_args: Vec<String>,
    api_key: String,
}

impl fmt::Debug for CensusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CensusConfig")
            .field("mcp_command", &self.mcp_command)
            .field("mcp_args", &self.mcp_args)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl CensusConfig {
    pub fn new(mcp_command: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            mcp_command: mcp_command.into(),
            mcp_args: Vec::new(),
            api_key: api_key.into(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mcp_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. The API key is checked
    /// first so a missing credential is reported before anything else.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(CENSUS_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingKey(CENSUS_API_KEY))?;

        let mcp_command = lookup(CENSUS_MCP_COMMAND)
            .filter(|cmd| !cmd.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MCP_COMMAND.to_string());

        let mcp_args = match lookup(CENSUS_MCP_ARGS) {
            Some(raw) if !raw.trim().is_empty() => {
                shlex::split(&raw).ok_or_else(|| ConfigError::InvalidValue {
                    key: CENSUS_MCP_ARGS,
                    reason: "unbalanced quotes".to_string(),
                })?
            }
            _ => Vec::new(),
        };

        Ok(Self {
            mcp_command,
            mcp_args,
            api_key,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Launch parameters for the server: the inherited environment plus the
    /// Census API key.
    pub fn server_params(&self) -> StdioServerParams {
        let mut envs = HashMap::new();
        envs.insert(CENSUS_API_KEY.to_string(), self.api_key.clone());
        StdioServerParams {
            command: self.mcp_command.clone(),
            args: self.mcp_args.clone(),
            envs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test_case(&[]; "unset")]
    #[test_case(&[(CENSUS_API_KEY, "")]; "empty")]
    #[test_case(&[(CENSUS_API_KEY, "   "), (CENSUS_MCP_COMMAND, "/bin/true")]; "whitespace")]
    fn missing_api_key_is_fatal(pairs: &[(&str, &str)]) {
        assert_eq!(
            CensusConfig::from_lookup(lookup_from(pairs)),
            Err(ConfigError::MissingKey(CENSUS_API_KEY))
        );
    }

    #[test]
    fn command_defaults_to_launcher_script() {
        let config = CensusConfig::from_lookup(lookup_from(&[(CENSUS_API_KEY, "abc")])).unwrap();
        assert_eq!(config.mcp_command, DEFAULT_MCP_COMMAND);
        assert!(config.mcp_args.is_empty());
        assert_eq!(config.api_key(), "abc");
    }

    #[test]
    fn args_are_shell_split() {
        let config = CensusConfig::from_lookup(lookup_from(&[
            (CENSUS_API_KEY, "abc"),
            (CENSUS_MCP_COMMAND, "bash"),
            (CENSUS_MCP_ARGS, "'/opt/census mcp/scripts/mcp-connect.sh' --verbose"),
        ]))
        .unwrap();
        assert_eq!(config.mcp_command, "bash");
        assert_eq!(
            config.mcp_args,
            vec!["/opt/census mcp/scripts/mcp-connect.sh", "--verbose"]
        );
    }

    #[test]
    fn unbalanced_args_are_rejected() {
        let err = CensusConfig::from_lookup(lookup_from(&[
            (CENSUS_API_KEY, "abc"),
            (CENSUS_MCP_ARGS, "'oops"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: CENSUS_MCP_ARGS,
                ..
            }
        ));
    }

    #[test]
    fn server_params_inject_api_key() {
        let params = CensusConfig::new("bash", "secret")
            .with_args(["mcp-connect.sh"])
            .server_params();
        assert_eq!(params.command, "bash");
        assert_eq!(params.args, vec!["mcp-connect.sh"]);
        assert_eq!(params.envs.get(CENSUS_API_KEY).map(String::as_str), Some("secret"));
    }

    #[test]
    fn debug_output_redacts_key() {
        let rendered = format!("{:?}", CensusConfig::new("bash", "super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn from_env_reads_process_environment() {
        let _guard = env_lock::lock_env([
            (CENSUS_API_KEY, Some("from-env")),
            (CENSUS_MCP_COMMAND, Some("/usr/local/bin/census-mcp")),
            (CENSUS_MCP_ARGS, None::<&str>),
        ]);
        let config = CensusConfig::from_env().unwrap();
        assert_eq!(config.api_key(), "from-env");
        assert_eq!(config.mcp_command, "/usr/local/bin/census-mcp");
    }
}
