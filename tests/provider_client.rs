use std::time::Duration;

use dashboard_api::ai::{
    generate_caption, generate_hashtags, resolve_provider, AiGateway, GenerationProvider,
    GenerationRequest, GenerationResponse, ProviderError,
};
use dashboard_api::error::AppError;
use dashboard_api::settings::AiSettings;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;

fn settings(model: &str) -> AiSettings {
    AiSettings {
        api_key: Some("sk-test".to_string()),
        enabled_models: vec![model.to_string()],
    }
}

fn gateway(server: &MockServer) -> AiGateway {
    AiGateway::new(server.base_url(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn chat_completion_request_carries_key_model_and_prompt() {
    let server = MockServer::start_async().await;
    let completion = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("Authorization", "Bearer sk-test")
            .json_body_partial(r#"{"model": "gpt-4o-mini", "max_tokens": 100}"#);
        then.status(200).json_body(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "#running, #shoes, #fitness" }
            }]
        }));
    });

    let resolved = resolve_provider(Some(&settings("gpt-4o-mini")), &gateway(&server)).unwrap();
    let tags = generate_hashtags(
        resolved.instance.as_ref(),
        &resolved.model,
        "I love my new running shoes!",
    )
    .await
    .unwrap();

    completion.assert();
    assert_eq!(tags, vec!["running", "shoes", "fitness"]);
}

#[tokio::test]
async fn caption_request_attaches_image_part() {
    let server = MockServer::start_async().await;
    let completion = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains(r#""type":"image_url""#)
            .body_contains("https://cdn.example.com/dog.jpg");
        then.status(200).json_body(json!({
            "choices": [{ "message": { "content": "A dog catching a frisbee." } }]
        }));
    });

    let resolved = resolve_provider(Some(&settings("gpt-4o")), &gateway(&server)).unwrap();
    let image = Url::parse("https://cdn.example.com/dog.jpg").unwrap();
    let caption = generate_caption(resolved.instance.as_ref(), &resolved.model, &image)
        .await
        .unwrap();

    completion.assert();
    assert_eq!(caption, "A dog catching a frisbee.");
}

#[tokio::test]
async fn upstream_error_message_is_surfaced() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(401).json_body(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        }));
    });

    let resolved = resolve_provider(Some(&settings("gpt-4o")), &gateway(&server)).unwrap();
    let err = resolved
        .instance
        .generate(GenerationRequest {
            model: resolved.model.name.clone(),
            prompt: "hello".into(),
            image_url: None,
            max_tokens: 10,
            temperature: None,
        })
        .await
        .unwrap_err();

    match err {
        ProviderError::Upstream { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_caption_from_provider_is_failure() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .json_body(json!({ "choices": [{ "message": { "content": "" } }] }));
    });

    let resolved = resolve_provider(Some(&settings("gpt-4o")), &gateway(&server)).unwrap();
    let image = Url::parse("https://cdn.example.com/readme.txt").unwrap();
    let err = generate_caption(resolved.instance.as_ref(), &resolved.model, &image)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Provider(_)));
    assert_eq!(err.to_string(), "No caption generated.");
}

#[tokio::test]
async fn raw_payload_is_returned_for_decoding() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .json_body(json!({ "generations": [{ "text": "#a #b" }] }));
    });

    let resolved = resolve_provider(Some(&settings("gpt-4o")), &gateway(&server)).unwrap();
    let raw = resolved
        .instance
        .generate(GenerationRequest {
            model: "gpt-4o".into(),
            prompt: "hello".into(),
            image_url: None,
            max_tokens: 10,
            temperature: Some(0.7),
        })
        .await
        .unwrap();
    assert_eq!(
        GenerationResponse::decode(raw),
        GenerationResponse::Generations(vec!["#a #b".to_string()])
    );
}
