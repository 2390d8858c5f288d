//! Source adapters wrapping the external trend, competitor and audience APIs.
//!
//! Every adapter follows the same path: raw-payload cache lookup, then the
//! HTTP call under [`RetryPolicy`], then a raw-payload cache write, then a
//! provider-specific translation into internal types. A terminal failure
//! yields the adapter's empty default instead of an error.

mod audience;
mod competitors;
mod trends;

pub use audience::AudienceSource;
pub use competitors::CompetitorSource;
pub use trends::{TrendProviderKind, TrendSource};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::cache::ContentCache;
use crate::error::AnalyticsError;
use crate::retry::RetryPolicy;

/// Uniform contract shared by all source adapters.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Output: Default + Send;

    /// Provider identity used in logs and raw-cache namespaces.
    fn name(&self) -> &'static str;

    /// Fetch and translate the provider's view of `subject_key`.
    ///
    /// Never fails: unreachable or misbehaving providers produce
    /// `Self::Output::default()`.
    async fn fetch(&self, subject_key: &str) -> Self::Output;
}

/// Builds the shared HTTP client used by every provider and the durable cache.
///
/// # Errors
///
/// Returns [`AnalyticsError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, AnalyticsError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Bearer-token JSON client for one provider.
#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl ProviderClient {
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Assembly`] if `base_url` is not a valid URL.
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Result<Self, AnalyticsError> {
        // Exactly one trailing slash so relative joins append to the path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            AnalyticsError::Assembly(format!("invalid provider URL '{base_url}': {e}"))
        })?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_owned(),
        })
    }

    fn build_url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, AnalyticsError> {
        let mut url = self.base_url.join(path.trim_start_matches('/')).map_err(|e| {
            AnalyticsError::Assembly(format!("invalid provider path '{path}': {e}"))
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends an authenticated GET and parses the JSON body.
    ///
    /// # Errors
    ///
    /// - [`AnalyticsError::RateLimited`] on HTTP 429 or a rate-limit error code in the body.
    /// - [`AnalyticsError::Unauthorized`] on HTTP 401/403.
    /// - [`AnalyticsError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`AnalyticsError::Http`] on network failure.
    /// - [`AnalyticsError::Deserialize`] if the body is not JSON.
    pub async fn get_json(
        &self,
        source_name: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, AnalyticsError> {
        let url = self.build_url(path, query)?;
        let request = self.client.get(url.clone());
        self.send(source_name, &url, request).await
    }

    /// Sends an authenticated JSON POST and parses the JSON body.
    ///
    /// # Errors
    ///
    /// Same classification as [`ProviderClient::get_json`].
    pub async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        source_name: &str,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value, AnalyticsError> {
        let url = self.build_url(path, &[])?;
        let request = self.client.post(url.clone()).json(body);
        self.send(source_name, &url, request).await
    }

    async fn send(
        &self,
        source_name: &str,
        url: &Url,
        request: reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, AnalyticsError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(AnalyticsError::RateLimited {
                source_name: source_name.to_owned(),
                retry_after_secs,
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AnalyticsError::Unauthorized {
                source_name: source_name.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<serde_json::Value>(&body);

        if let Ok(value) = &parsed {
            if signals_rate_limit(value) {
                return Err(AnalyticsError::RateLimited {
                    source_name: source_name.to_owned(),
                    retry_after_secs: None,
                });
            }
        }

        if !status.is_success() {
            return Err(AnalyticsError::UnexpectedStatus {
                source_name: source_name.to_owned(),
                status: status.as_u16(),
            });
        }

        parsed.map_err(|e| AnalyticsError::Deserialize {
            context: format!("{source_name} response from {}", url.path()),
            source: e,
        })
    }
}

/// Detects an explicit rate-limit error in a JSON body, e.g.
/// `{"error": {"code": "rate_limit_exceeded"}}` or `{"error": "Rate limit hit"}`.
pub(crate) fn signals_rate_limit(body: &serde_json::Value) -> bool {
    let Some(error) = body.get("error") else {
        return false;
    };
    let texts = [
        error.as_str(),
        error.get("code").and_then(serde_json::Value::as_str),
        error.get("type").and_then(serde_json::Value::as_str),
        error.get("message").and_then(serde_json::Value::as_str),
    ];
    texts.into_iter().flatten().any(|text| {
        let lower = text.to_ascii_lowercase();
        lower.contains("rate_limit") || lower.contains("rate limit") || lower.contains("ratelimit")
    })
}

/// Reads a number that providers may send as a JSON number or numeric string.
pub(crate) fn as_number(value: &serde_json::Value) -> Option<f64> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Cache-then-network fetch of one raw provider payload.
///
/// Cache read failures count as a miss and cache write failures are logged;
/// only the provider call itself can fail this function.
pub(crate) async fn fetch_payload(
    cache: &ContentCache,
    retry: &RetryPolicy,
    client: &ProviderClient,
    source_name: &'static str,
    subject_key: &str,
    path: &str,
    query: &[(&str, &str)],
) -> Result<serde_json::Value, AnalyticsError> {
    match cache.get_raw(source_name, subject_key).await {
        Ok(Some(payload)) => {
            tracing::debug!(source = source_name, subject_key, "raw payload cache hit");
            return Ok(payload);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(source = source_name, error = %e, "raw cache read failed; fetching");
        }
    }

    let payload = retry
        .execute(source_name, || client.get_json(source_name, path, query))
        .await?;

    if let Err(e) = cache.set_raw(source_name, subject_key, &payload).await {
        tracing::warn!(source = source_name, error = %e, "raw cache write failed");
    }

    Ok(payload)
}

/// Shared wiring for an adapter: optional client plus cache and retry policy.
#[derive(Clone)]
pub(crate) struct SourceDeps {
    pub(crate) client: Option<ProviderClient>,
    pub(crate) cache: ContentCache,
    pub(crate) retry: RetryPolicy,
}

impl SourceDeps {
    /// Fetch a payload, logging and swallowing failures.
    ///
    /// Returns `None` when the provider is not configured or failed terminally.
    pub(crate) async fn fetch_or_log(
        &self,
        source_name: &'static str,
        subject_key: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Option<serde_json::Value> {
        let Some(client) = &self.client else {
            tracing::debug!(source = source_name, "provider not configured; using empty default");
            return None;
        };
        match fetch_payload(
            &self.cache,
            &self.retry,
            client,
            source_name,
            subject_key,
            path,
            query,
        )
        .await
        {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(
                    source = source_name,
                    code = %e.code(),
                    error = %e,
                    "provider failed; substituting empty default"
                );
                None
            }
        }
    }

    /// Deserialize a provider payload into its typed shape, logging failures.
    pub(crate) fn decode<T: serde::de::DeserializeOwned>(
        source_name: &'static str,
        payload: serde_json::Value,
    ) -> Option<T> {
        match serde_json::from_value(payload) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(source = source_name, error = %e, "provider payload has unexpected shape");
                None
            }
        }
    }
}
