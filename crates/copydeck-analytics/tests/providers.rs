//! Source adapter behavior against wiremock provider APIs.

use copydeck_analytics::{
    AudienceSource, CompetitorSource, ContentCache, ProviderClient, RetryPolicy, SourceAdapter,
    TrendProviderKind, TrendSource,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ProviderClient {
    ProviderClient::new(reqwest::Client::new(), &server.uri(), "test-key")
        .expect("client construction should not fail")
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, 0)
}

#[tokio::test]
async fn search_interest_payload_is_translated() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "interest": {
            "cold brew": {
                "timeline": [
                    {"date": "2024-01-01", "value": 40},
                    {"date": "2024-02-01", "value": 60}
                ],
                "related_queries": [{"query": "nitro cold brew", "score": 90}],
                "demographics": {"age_groups": ["25-34"], "regions": ["US"]}
            }
        }
    });

    Mock::given(method("GET"))
        .and(path("/v1/interest"))
        .and(query_param("keywords", "cold brew"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let source = TrendSource::new(
        TrendProviderKind::SearchInterest,
        Some(client(&server)),
        ContentCache::in_memory(),
        fast_retry(),
    );
    let trends = source.fetch("cold brew").await;

    assert_eq!(trends.provider, "search_interest");
    assert_eq!(trends.series.len(), 1);
    assert_eq!(trends.series[0].points.len(), 2);
    assert!(trends.series[0].demographics.locations.contains("US"));
    assert_eq!(trends.related[0].name, "nitro cold brew");
}

#[tokio::test]
async fn raw_payload_is_cached_between_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/keywords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "keywords": [{"keyword": "cold brew", "search_volume": 74000, "difficulty": 55}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = ContentCache::in_memory();
    let source = TrendSource::new(
        TrendProviderKind::KeywordMetrics,
        Some(client(&server)),
        cache.clone(),
        fast_retry(),
    );

    let first = source.fetch("cold brew").await;
    let second = source.fetch("cold brew").await;
    assert_eq!(first, second);
    assert!(cache
        .get_raw("keyword_metrics", "cold brew")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn rate_limited_provider_is_retried_then_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/competitors"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let source = CompetitorSource::new(Some(client(&server)), ContentCache::in_memory(), fast_retry());
    let analysis = source.fetch("cold brew").await;
    assert!(analysis.competitors.is_empty());
}

#[tokio::test]
async fn rate_limit_in_json_body_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/audience"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": {"code": "rate_limit_exceeded"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/audience"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "segments": [{"name": "Home baristas", "share": 0.6}]
        })))
        .mount(&server)
        .await;

    let source = AudienceSource::new(Some(client(&server)), ContentCache::in_memory(), fast_retry());
    let insights = source.fetch("cold brew").await;
    assert_eq!(insights.segments.len(), 1);
}

#[tokio::test]
async fn unauthorized_provider_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/audience"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let source = AudienceSource::new(Some(client(&server)), ContentCache::in_memory(), fast_retry());
    assert!(source.fetch("cold brew").await.segments.is_empty());
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/competitors"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let source = CompetitorSource::new(Some(client(&server)), ContentCache::in_memory(), fast_retry());
    assert!(source.fetch("cold brew").await.competitors.is_empty());
}

#[tokio::test]
async fn malformed_payload_yields_default_without_caching_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/competitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "competitors": "not a list"
        })))
        .mount(&server)
        .await;

    let source = CompetitorSource::new(Some(client(&server)), ContentCache::in_memory(), fast_retry());
    let analysis = source.fetch("cold brew").await;
    assert!(analysis.competitors.is_empty());
    assert!(analysis.average_market_share.abs() < f64::EPSILON);
}

#[tokio::test]
async fn provider_client_reports_typed_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = client(&server);
    let limited = client.get_json("catalog", "v1/limited", &[]).await.unwrap_err();
    assert!(matches!(
        limited,
        copydeck_analytics::AnalyticsError::RateLimited {
            retry_after_secs: Some(7),
            ..
        }
    ));

    let broken = client.get_json("catalog", "v1/broken", &[]).await.unwrap_err();
    assert_eq!(broken.code(), copydeck_analytics::ErrorCode::BadResponse);
}
