//! `LlmNarrative` against a wiremock chat-completions API.

use copydeck_analytics::{ErrorCode, LlmNarrative, NarrativeMetrics, ProviderClient, RetryPolicy};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn narrative(server: &MockServer, attempts: u32) -> LlmNarrative {
    let client = ProviderClient::new(reqwest::Client::new(), &server.uri(), "llm-key")
        .expect("client construction should not fail");
    LlmNarrative::new(client, "gpt-4o-mini", RetryPolicy::new(attempts, 0))
}

fn completion(content: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
    })
}

#[tokio::test]
async fn completion_content_is_parsed_into_insights() {
    let server = MockServer::start().await;
    let insights = serde_json::json!({
        "readability": {"score": 72.5, "level": "easy", "read_time_minutes": 2, "retention": 0.8},
        "emotional": {"score": 0.4, "tone": "upbeat", "triggers": ["discover"]},
        "seo": {"score": 64, "keyword_density": {"cold brew": 1.2}}
    });

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer llm-key"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&insights)))
        .expect(1)
        .mount(&server)
        .await;

    let result = narrative(&server, 3)
        .analyze("Discover cold brew.", &["cold brew".to_owned()])
        .await
        .unwrap();

    assert!((result.readability.score - 72.5).abs() < f64::EPSILON);
    assert_eq!(result.readability.level, "easy");
    assert_eq!(result.emotional.tone, "upbeat");
    assert!((result.seo.keyword_density["cold brew"] - 1.2).abs() < f64::EPSILON);
    assert!(result.readability.hotspots.is_empty());
}

#[tokio::test]
async fn rate_limited_completion_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&serde_json::json!({}))))
        .mount(&server)
        .await;

    let result = narrative(&server, 3).analyze("copy", &[]).await.unwrap();
    assert!(result.readability.score.abs() < f64::EPSILON);
}

#[tokio::test]
async fn non_json_completion_is_a_bad_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "Sure! Here is my analysis."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = narrative(&server, 3).analyze("copy", &[]).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadResponse);
}

#[tokio::test]
async fn missing_message_is_a_narrative_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let err = narrative(&server, 1).analyze("copy", &[]).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Narrative);
}
