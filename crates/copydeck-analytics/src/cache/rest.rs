//! Durable cache backend speaking a Redis-over-HTTP REST protocol.
//!
//! Each command is POSTed to the store root as a JSON array
//! (`["SET", key, value, "EX", ttl]`) with a bearer token. Replies are
//! `{"result": ...}` on success and `{"error": "..."}` on failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::CacheBackend;
use crate::error::AnalyticsError;

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: serde_json::Value,
    error: Option<String>,
}

pub struct RestKvBackend {
    client: Client,
    url: Url,
    token: String,
}

impl RestKvBackend {
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Cache`] if `url` does not parse.
    pub fn new(client: Client, url: &str, token: &str) -> Result<Self, AnalyticsError> {
        let url = Url::parse(url)
            .map_err(|e| AnalyticsError::Cache(format!("invalid cache URL '{url}': {e}")))?;
        Ok(Self {
            client,
            url,
            token: token.to_owned(),
        })
    }

    async fn command(&self, args: &[&str]) -> Result<serde_json::Value, AnalyticsError> {
        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .map_err(|e| AnalyticsError::Cache(format!("{} request failed: {e}", args[0])))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalyticsError::Cache(format!("{} body read failed: {e}", args[0])))?;

        let reply: CommandReply = serde_json::from_str(&body).map_err(|e| {
            AnalyticsError::Cache(format!(
                "{} returned unparseable reply (HTTP {status}): {e}",
                args[0]
            ))
        })?;

        if let Some(error) = reply.error {
            return Err(AnalyticsError::Cache(format!("{} rejected: {error}", args[0])));
        }
        if !status.is_success() {
            return Err(AnalyticsError::Cache(format!(
                "{} returned status {status}",
                args[0]
            )));
        }

        Ok(reply.result)
    }
}

#[async_trait]
impl CacheBackend for RestKvBackend {
    fn name(&self) -> &'static str {
        "rest_kv"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AnalyticsError> {
        match self.command(&["GET", key]).await? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => Ok(Some(s.into_bytes())),
            other => Err(AnalyticsError::Cache(format!(
                "GET returned non-string result: {other}"
            ))),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), AnalyticsError> {
        let value = String::from_utf8(value)
            .map_err(|e| AnalyticsError::Cache(format!("cache value is not UTF-8: {e}")))?;
        // The store rejects EX 0; a zero TTL still gets the shortest expiry.
        let ttl_secs = ttl.as_secs().max(1).to_string();
        self.command(&["SET", key, &value, "EX", &ttl_secs]).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), AnalyticsError> {
        self.command(&["DEL", key]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_url() {
        let result = RestKvBackend::new(Client::new(), "not a url", "t");
        assert!(matches!(result, Err(AnalyticsError::Cache(_))));
    }

    #[test]
    fn reply_without_result_defaults_to_null() {
        let reply: CommandReply = serde_json::from_str(r#"{"error": "WRONGTYPE"}"#).unwrap();
        assert!(reply.result.is_null());
        assert_eq!(reply.error.as_deref(), Some("WRONGTYPE"));
    }
}
