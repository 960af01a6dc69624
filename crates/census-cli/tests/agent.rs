use census::agents::AgentError;
use census::config::CENSUS_API_KEY;
use census::conversation::message::{Message, ToolCall};
use census::model::ToolChoice;
use census::providers::errors::ProviderError;
use census::tools::FETCH_AGGREGATE_DATA_TOOL;
use census_cli::commands::agent::{handle_agent, AgentOptions, DEFAULT_INSTRUCTIONS};
use census_cli::signal::Interrupted;
use census_test_support::{FakeConnector, FakeMcpClient, ScriptedProvider, FIXTURE_POPULATION};
use serial_test::serial;

const COUNTY_ARGS: &str = r#"{"year":2023,"dataset":"acs/acs5","geography":{"type":"county","fips":"24031"},"variables":["B19001_001E"]}"#;

fn fetch_call(id: &str) -> Message {
    Message::assistant_tool_calls(vec![ToolCall::new(id, FETCH_AGGREGATE_DATA_TOOL, COUNTY_ARGS)])
}

async fn run(
    connector: &FakeConnector,
    provider: &ScriptedProvider,
    opts: &AgentOptions,
) -> (anyhow::Result<()>, String) {
    let mut out = Vec::new();
    let result = handle_agent(connector, provider, opts, &mut out, std::future::pending()).await;
    (result, String::from_utf8(out).unwrap())
}

#[tokio::test]
#[serial]
async fn default_question_prints_final_output() {
    let _guard = env_lock::lock_env([(CENSUS_API_KEY, Some("test-key"))]);
    let connector = FakeConnector::new(FakeMcpClient::census(FIXTURE_POPULATION));
    let provider = ScriptedProvider::always_answering("fixed final output");

    let (result, output) = run(&connector, &provider, &AgentOptions::default()).await;
    result.unwrap();
    assert_eq!(output, "fixed final output\n");

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4.1-mini");
    assert_eq!(requests[0].tool_choice, ToolChoice::Auto);
    assert_eq!(requests[0].system, DEFAULT_INSTRUCTIONS);
    assert_eq!(
        requests[0].messages,
        vec![Message::user("What is the income distribution for FIPS code 24031?")]
    );
    assert_eq!(requests[0].tool_names, vec![FETCH_AGGREGATE_DATA_TOOL]);
    assert_eq!(connector.log().shutdowns(), 1);
}

#[tokio::test]
#[serial]
async fn tool_list_is_fetched_once_per_run() {
    let _guard = env_lock::lock_env([(CENSUS_API_KEY, Some("test-key"))]);
    let connector = FakeConnector::new(FakeMcpClient::census("Montgomery County,372000"));
    let provider = ScriptedProvider::new()
        .then(fetch_call("call_1"))
        .then(fetch_call("call_2"))
        .then(Message::assistant("Median household income is high."));

    let (result, output) = run(&connector, &provider, &AgentOptions::default()).await;
    result.unwrap();
    assert_eq!(output, "Median household income is high.\n");

    let log = connector.log();
    assert_eq!(log.list_tools_calls(), 1);
    assert_eq!(log.tool_calls().len(), 2);
    assert_eq!(log.shutdowns(), 1);

    let last = provider.requests().pop().unwrap();
    assert!(last
        .messages
        .contains(&Message::tool_result("call_2", "Montgomery County,372000")));
}

#[tokio::test]
#[serial]
async fn provider_failure_mid_run_still_shuts_down_server() {
    let _guard = env_lock::lock_env([(CENSUS_API_KEY, Some("test-key"))]);
    let connector = FakeConnector::new(FakeMcpClient::census(FIXTURE_POPULATION));
    let provider = ScriptedProvider::new()
        .then(fetch_call("call_1"))
        .then_fail(ProviderError::ServerError("upstream exploded".to_string()));

    let (result, output) = run(&connector, &provider, &AgentOptions::default()).await;
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AgentError>(),
        Some(AgentError::Provider(ProviderError::ServerError(_)))
    ));
    assert!(output.is_empty());
    assert_eq!(connector.log().tool_calls().len(), 1);
    assert_eq!(connector.log().shutdowns(), 1);
}

#[tokio::test]
#[serial]
async fn transport_failure_propagates() {
    let _guard = env_lock::lock_env([(CENSUS_API_KEY, Some("test-key"))]);
    let client =
        FakeMcpClient::census(FIXTURE_POPULATION).with_broken_tool(FETCH_AGGREGATE_DATA_TOOL);
    let connector = FakeConnector::new(client);
    let provider = ScriptedProvider::new().then(fetch_call("call_1"));

    let (result, _) = run(&connector, &provider, &AgentOptions::default()).await;
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AgentError>(),
        Some(AgentError::Mcp(_))
    ));
    assert_eq!(connector.log().shutdowns(), 1);
}

#[tokio::test]
#[serial]
async fn missing_api_key_fails_before_connecting() {
    let _guard = env_lock::lock_env([(CENSUS_API_KEY, None::<&str>)]);
    let connector = FakeConnector::new(FakeMcpClient::census(FIXTURE_POPULATION));
    let provider = ScriptedProvider::always_answering("unused");

    let (result, _) = run(&connector, &provider, &AgentOptions::default()).await;
    assert!(result.is_err());
    assert_eq!(connector.log().connects(), 0);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
#[serial]
async fn interrupt_during_run_cleans_up_server() {
    let _guard = env_lock::lock_env([(CENSUS_API_KEY, Some("test-key"))]);
    let client =
        FakeMcpClient::census(FIXTURE_POPULATION).with_hanging_tool(FETCH_AGGREGATE_DATA_TOOL);
    let connector = FakeConnector::new(client);
    let log = connector.log();
    let provider = ScriptedProvider::new().then(fetch_call("call_1"));
    let mut out = Vec::new();

    let result = handle_agent(
        &connector,
        &provider,
        &AgentOptions::default(),
        &mut out,
        async move { log.wait_for_hung_call().await },
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.downcast_ref::<Interrupted>(), Some(&Interrupted));
    assert!(out.is_empty());
    assert_eq!(connector.log().tool_calls().len(), 1);
    assert_eq!(connector.log().shutdowns(), 1);
}

#[tokio::test]
#[serial]
async fn empty_final_answer_prints_empty_line() {
    let _guard = env_lock::lock_env([(CENSUS_API_KEY, Some("test-key"))]);
    let connector = FakeConnector::new(FakeMcpClient::census(FIXTURE_POPULATION));
    let provider = ScriptedProvider::new().then(Message::assistant(""));

    let (result, output) = run(&connector, &provider, &AgentOptions::default()).await;
    result.unwrap();
    assert_eq!(output, "\n");
    assert_eq!(connector.log().shutdowns(), 1);
}
