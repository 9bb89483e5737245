use std::env;

use dotenvy::dotenv;
use straico::config::{API_KEY_ENV, BASE_URL_ENV, ClientConfig, build_client_from_config};
use straico::http::reqwest::default_dyn_transport;
use straico::{ApiVersion, ChatRequest, PricingMethod, StraicoClient, StraicoError};

fn load_env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn build_client_from_env(api_version: ApiVersion) -> Option<StraicoClient> {
    let Some(api_key) = load_env_var(API_KEY_ENV) else {
        eprintln!("skipping live test: {API_KEY_ENV} not set");
        return None;
    };
    let config = ClientConfig {
        api_key,
        api_version,
        base_url: load_env_var(BASE_URL_ENV),
    };
    let transport = default_dyn_transport().expect("transport");
    Some(build_client_from_config(&config, transport).expect("client"))
}

#[tokio::test]
#[ignore = "requires STRAICO_API_KEY and network access"]
async fn straico_live_smart_selector_answers() {
    dotenv().ok();
    let Some(client) = build_client_from_env(ApiVersion::V1) else {
        return;
    };

    let response = client
        .chat(
            &ChatRequest::new("Reply with the single word: pong")
                .with_pricing(PricingMethod::Budget)
                .with_animation(false),
        )
        .await
        .expect("smart selector request should succeed");
    let text = response.text().expect("completion").unwrap_or_default();
    assert!(
        text.to_lowercase().contains("pong"),
        "unexpected answer: {text}"
    );
}

#[tokio::test]
#[ignore = "requires STRAICO_API_KEY and network access"]
async fn straico_live_catalog_and_unknown_model() {
    dotenv().ok();
    let Some(client) = build_client_from_env(ApiVersion::V1) else {
        return;
    };

    let catalog = client.get_models().await.expect("catalog");
    assert!(!catalog.is_empty());

    let err = client
        .chat(
            &ChatRequest::new("hi")
                .with_model("openai/gpt-4o-typo")
                .with_animation(false),
        )
        .await
        .expect_err("misspelled model should be rejected");
    assert!(
        matches!(err, StraicoError::Api { .. }),
        "expected api error, got {err:?}"
    );
    eprintln!("suggestions: {:?}", err.suggestions());
}
