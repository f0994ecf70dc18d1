//! Expiring key-value backends for session state

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::Result;

/// A key-value service with per-key TTL
///
/// Each call is atomic for its single key. TTL eviction is a backstop only;
/// callers that care about exact expiry must check their own timestamps.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Write `value` at `key`, replacing any existing entry and its TTL
    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Write only if no live entry exists; returns whether the write happened
    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove `key`; removing an absent key succeeds
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    deadline: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.deadline
    }
}

/// In-process backend with monotonic-time TTLs
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry whose TTL has passed, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of stored entries, including ones not yet swept
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run `purge_expired` every `interval` until the task is aborted
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let backend = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let purged = backend.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(purged, "Evicted expired backend entries");
                }
            }
        })
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value,
            deadline: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                deadline: now + ttl,
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let backend = MemoryBackend::new();
        backend
            .set_with_ttl("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));

        backend.delete("k").await.unwrap();
        assert!(backend.get("k").await.unwrap().is_none());
        // Deleting again is fine
        backend.delete("k").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_backstop() {
        let backend = MemoryBackend::new();
        backend
            .set_with_ttl("k", "v".to_string(), Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(backend.get("k").await.unwrap().is_none());
        assert_eq!(backend.len().await, 1);
        assert_eq!(backend.purge_expired().await, 1);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let backend = MemoryBackend::new();
        let ttl = Duration::from_secs(60);
        assert!(backend.set_if_absent("k", "1".to_string(), ttl).await.unwrap());
        assert!(!backend.set_if_absent("k", "2".to_string(), ttl).await.unwrap());
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_if_absent_replaces_expired() {
        let backend = MemoryBackend::new();
        assert!(backend
            .set_if_absent("k", "1".to_string(), Duration::from_secs(1))
            .await
            .unwrap());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(backend
            .set_if_absent("k", "2".to_string(), Duration::from_secs(1))
            .await
            .unwrap());
    }
}
