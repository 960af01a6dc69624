use census_cli::commands::prompt::{handle_prompt, PromptOptions};
use census_test_support::ScriptedProvider;

#[tokio::test]
async fn prompt_prints_generated_text() {
    let provider = ScriptedProvider::generating("Maryland had 6,177,224 residents in 2020.");
    let mut out = Vec::new();

    handle_prompt(&provider, &PromptOptions::default(), &mut out)
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Maryland had 6,177,224 residents in 2020.\n"
    );
    assert_eq!(
        provider.prompts(),
        vec![(
            "gpt-5".to_string(),
            "You are a helpful assistant".to_string(),
            "According to Census 2020 what is the population of Maryland?".to_string(),
        )]
    );
}
