//! Content-addressed cache for analytics reports and raw provider payloads.
//!
//! [`ContentCache`] is a thin typed layer over a [`CacheBackend`]. The backend
//! is chosen once at startup ([`ContentCache::from_config`]); callers never
//! learn which one is active. Backend failures surface as
//! [`AnalyticsError::Cache`] on the individual call.

mod memory;
mod rest;

pub use memory::MemoryBackend;
pub use rest::RestKvBackend;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use copydeck_core::{AnalyticsReport, DurableCacheConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AnalyticsError;

/// Default entry lifetime: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Byte-oriented key/value store with per-entry TTL.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend identifier for logs and health output.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AnalyticsError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), AnalyticsError>;

    async fn del(&self, key: &str) -> Result<(), AnalyticsError>;

    /// Drop expired entries, returning how many were removed. Stores that
    /// expire keys on their own keep this default.
    async fn purge_expired(&self) -> usize {
        0
    }
}

/// Derive the report key for a `(content, format)` pair.
///
/// Hex SHA-256 over `content`, a NUL byte, then `format`. Byte-identical
/// inputs always map to the same key.
#[must_use]
pub fn report_key(content: &str, format: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update([0u8]);
    hasher.update(format.as_bytes());
    format!("report:{:x}", hasher.finalize())
}

/// Key for a raw provider payload identified by an external subject key.
#[must_use]
pub fn raw_key(namespace: &str, key: &str) -> String {
    format!("raw:{namespace}:{key}")
}

#[derive(Clone)]
pub struct ContentCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl ContentCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Process-local cache with the default TTL.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), DEFAULT_TTL)
    }

    /// Select the backend once: the durable store when configured, otherwise
    /// the in-process map.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Cache`] if the durable store URL is invalid.
    pub fn from_config(
        durable: Option<&DurableCacheConfig>,
        ttl: Duration,
        client: reqwest::Client,
    ) -> Result<Self, AnalyticsError> {
        let backend: Arc<dyn CacheBackend> = match durable {
            Some(cfg) => Arc::new(RestKvBackend::new(client, &cfg.url, &cfg.token)?),
            None => Arc::new(MemoryBackend::new()),
        };
        tracing::info!(backend = backend.name(), ttl_secs = ttl.as_secs(), "cache backend selected");
        Ok(Self::new(backend, ttl))
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Sweep expired entries from the backend.
    pub async fn purge_expired(&self) -> usize {
        self.backend.purge_expired().await
    }

    /// Fetch the cached report for `(content, format)`.
    ///
    /// Entries that fail to decode are logged and reported as a miss.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Cache`] if the backend request fails.
    pub async fn get(
        &self,
        content: &str,
        format: &str,
    ) -> Result<Option<AnalyticsReport>, AnalyticsError> {
        self.get_decoded(&report_key(content, format)).await
    }

    /// Store `report` under the key for `(content, format)`, overwriting any
    /// previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Cache`] if the backend request fails.
    pub async fn set(
        &self,
        content: &str,
        format: &str,
        report: &AnalyticsReport,
    ) -> Result<(), AnalyticsError> {
        self.set_encoded(&report_key(content, format), report).await
    }

    /// Remove the cached report for `(content, format)`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Cache`] if the backend request fails.
    pub async fn invalidate(&self, content: &str, format: &str) -> Result<(), AnalyticsError> {
        self.backend.del(&report_key(content, format)).await
    }

    /// Fetch a raw provider payload.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Cache`] if the backend request fails.
    pub async fn get_raw(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, AnalyticsError> {
        self.get_decoded(&raw_key(namespace, key)).await
    }

    /// Store a raw provider payload.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Cache`] if the backend request fails.
    pub async fn set_raw(
        &self,
        namespace: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), AnalyticsError> {
        self.set_encoded(&raw_key(namespace, key), value).await
    }

    async fn get_decoded<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, AnalyticsError> {
        let Some(bytes) = self.backend.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "undecodable cache entry; treating as miss");
                Ok(None)
            }
        }
    }

    async fn set_encoded<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AnalyticsError> {
        let bytes = serde_json::to_vec(value).map_err(|e| AnalyticsError::Deserialize {
            context: format!("encoding cache entry {key}"),
            source: e,
        })?;
        self.backend.set(key, bytes, self.ttl).await
    }
}
