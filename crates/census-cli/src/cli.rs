use std::io;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use census::mcp_client::StdioConnector;
use census::model::ToolChoice;
use census::providers::openai::{OpenAiProvider, OPEN_AI_DEFAULT_AGENT_MODEL, OPEN_AI_DEFAULT_MODEL};
use census::tools::{
    Geography, DEFAULT_DATASET, DEFAULT_GEOGRAPHY_TYPE, DEFAULT_STATE_FIPS, DEFAULT_VARIABLE,
    DEFAULT_YEAR, FETCH_AGGREGATE_DATA_TOOL,
};

use crate::commands::agent::{self, handle_agent, AgentOptions};
use crate::commands::prompt::{self, handle_prompt, PromptOptions};
use crate::commands::session::{handle_session, SessionOptions};
use crate::signal::shutdown_signal;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the model a question directly, without Census tools
    Prompt {
        #[arg(long, default_value = OPEN_AI_DEFAULT_MODEL)]
        model: String,

        #[arg(long, default_value = prompt::DEFAULT_INSTRUCTIONS)]
        instructions: String,

        #[arg(default_value = prompt::DEFAULT_QUESTION)]
        question: String,
    },

    /// Let an agent answer a question using the Census MCP tools
    Agent {
        #[arg(long, default_value = OPEN_AI_DEFAULT_AGENT_MODEL)]
        model: String,

        #[arg(long, default_value = "auto", value_parser = clap::value_parser!(ToolChoice))]
        tool_choice: ToolChoice,

        #[arg(long, default_value = agent::DEFAULT_INSTRUCTIONS)]
        instructions: String,

        #[arg(
            long,
            default_value_t = census::agents::DEFAULT_MAX_TURNS,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        max_turns: u32,

        #[arg(default_value = agent::DEFAULT_QUESTION)]
        question: String,
    },

    /// Open an MCP session, list the tools and call one of them
    Session(SessionArgs),
}

#[derive(Args)]
struct SessionArgs {
    #[arg(long, default_value = FETCH_AGGREGATE_DATA_TOOL)]
    tool: String,

    #[arg(long, default_value_t = DEFAULT_YEAR)]
    year: u32,

    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: String,

    #[arg(long, default_value = DEFAULT_GEOGRAPHY_TYPE)]
    geography_type: String,

    #[arg(long, default_value = DEFAULT_STATE_FIPS)]
    fips: String,

    /// Census variable code; repeat for several
    #[arg(long = "variable", action = clap::ArgAction::Append)]
    variables: Vec<String>,
}

impl From<SessionArgs> for SessionOptions {
    fn from(args: SessionArgs) -> Self {
        let variables = if args.variables.is_empty() {
            vec![DEFAULT_VARIABLE.to_string()]
        } else {
            args.variables
        };
        SessionOptions::new(
            args.tool,
            args.year,
            args.dataset,
            Geography::new(args.geography_type, args.fips),
            variables,
        )
    }
}

pub async fn cli() -> Result<()> {
    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::Prompt {
            model,
            instructions,
            question,
        } => {
            let provider = OpenAiProvider::from_env()?;
            let opts = PromptOptions {
                model,
                instructions,
                question,
            };
            handle_prompt(&provider, &opts, &mut stdout).await
        }
        Command::Agent {
            model,
            tool_choice,
            instructions,
            max_turns,
            question,
        } => {
            let provider = OpenAiProvider::from_env()?;
            let opts = AgentOptions {
                model,
                tool_choice,
                instructions,
                question,
                max_turns,
            };
            handle_agent(
                &StdioConnector,
                &provider,
                &opts,
                &mut stdout,
                shutdown_signal(),
            )
            .await
        }
        Command::Session(args) => {
            let opts = SessionOptions::from(args);
            handle_session(&StdioConnector, &opts, &mut stdout, shutdown_signal()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn session_defaults_match_literal_payload() {
        let cli = Cli::try_parse_from(["census", "session"]).unwrap();
        let Command::Session(args) = cli.command else {
            panic!("expected session subcommand");
        };
        let opts = SessionOptions::from(args);
        assert_eq!(opts.tool, FETCH_AGGREGATE_DATA_TOOL);
        assert_eq!(opts.arguments, census::tools::FetchAggregateDataArgs::default());
    }

    #[test]
    fn session_flags_override_payload() {
        let cli = Cli::try_parse_from([
            "census",
            "session",
            "--year",
            "2020",
            "--geography-type",
            "county",
            "--fips",
            "24031",
            "--variable",
            "B19001_001E",
            "--variable",
            "B19001_002E",
        ])
        .unwrap();
        let Command::Session(args) = cli.command else {
            panic!("expected session subcommand");
        };
        let opts = SessionOptions::from(args);
        assert_eq!(opts.arguments.year, 2020);
        assert_eq!(opts.arguments.geography, Geography::new("county", "24031"));
        assert_eq!(opts.arguments.variables, vec!["B19001_001E", "B19001_002E"]);
    }

    #[test_case("auto", ToolChoice::Auto)]
    #[test_case("required", ToolChoice::Required)]
    #[test_case("none", ToolChoice::None)]
    fn agent_tool_choice_is_parsed(flag: &str, expected: ToolChoice) {
        let cli = Cli::try_parse_from(["census", "agent", "--tool-choice", flag]).unwrap();
        let Command::Agent {
            tool_choice,
            model,
            question,
            ..
        } = cli.command
        else {
            panic!("expected agent subcommand");
        };
        assert_eq!(tool_choice, expected);
        assert_eq!(model, OPEN_AI_DEFAULT_AGENT_MODEL);
        assert_eq!(question, agent::DEFAULT_QUESTION);
    }

    #[test_case("0"; "zero")]
    #[test_case("-3"; "negative")]
    fn max_turns_must_be_positive(value: &str) {
        assert!(Cli::try_parse_from(["census", "agent", "--max-turns", value]).is_err());
    }

    #[test]
    fn max_turns_accepts_one() {
        let cli = Cli::try_parse_from(["census", "agent", "--max-turns", "1"]).unwrap();
        let Command::Agent { max_turns, .. } = cli.command else {
            panic!("expected agent subcommand");
        };
        assert_eq!(max_turns, 1);
    }

    #[test]
    fn unknown_tool_choice_is_rejected() {
        assert!(Cli::try_parse_from(["census", "agent", "--tool-choice", "sometimes"]).is_err());
    }
}
