use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::CacheBackend;
use crate::error::AnalyticsError;

#[derive(Debug)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache backend.
///
/// Expiry is checked lazily on read; [`CacheBackend::purge_expired`] sweeps
/// the rest. Safe for concurrent use from multiple orchestration runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until read or purged.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AnalyticsError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), AnalyticsError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), MemoryEntry { value, expires_at });
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), AnalyticsError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn get_returns_stored_value() {
        let backend = MemoryBackend::new();
        backend
            .set("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn set_overwrites_last_write_wins() {
        let backend = MemoryBackend::new();
        backend.set("k", b"1".to_vec(), Duration::from_secs(60)).await.unwrap();
        backend.set("k", b"2".to_vec(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_removed_on_read() {
        let backend = MemoryBackend::new();
        backend.set("k", b"v".to_vec(), Duration::ZERO).await.unwrap();
        assert_eq!(backend.len().await, 1);
        assert!(backend.get("k").await.unwrap().is_none());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn purge_expired_keeps_live_entries() {
        let backend = MemoryBackend::new();
        backend.set("old", b"v".to_vec(), Duration::ZERO).await.unwrap();
        backend
            .set("fresh", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(backend.purge_expired().await, 1);
        assert_eq!(backend.len().await, 1);
        assert!(backend.get("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_entries() {
        let backend = Arc::new(MemoryBackend::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                backend
                    .set(&format!("k{i}"), vec![1], Duration::from_secs(60))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(backend.len().await, 32);
    }
}
