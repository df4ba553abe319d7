//! In-process TTL store

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use sso_core::{DomainError, KeyedExpiringStore};
use sso_shared::utils::now_millis;

struct Entry {
    value: String,
    expires_at_ms: i64,
}

impl Entry {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Single-instance store. Expired entries are hidden from readers
/// immediately and reclaimed lazily on access or by the sweeper.
#[derive(Default)]
pub struct MemoryStore {
    map: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&self) {
        self.map.clear();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = now_millis();
        let before = self.map.len();
        self.map.retain(|_, e| !e.is_expired(now));
        before.saturating_sub(self.map.len())
    }

    /// Remove `key` only while the stored entry is still expired, so a value
    /// written concurrently by `put` survives.
    fn evict_if_expired(&self, key: &str, now_ms: i64) -> bool {
        self.map
            .remove_if(key, |_, e| e.is_expired(now_ms))
            .is_some()
    }

    pub async fn run_sweeper(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = self.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = self.len(), "Expired store entries purged");
            }
        }
    }
}

#[async_trait]
impl KeyedExpiringStore for MemoryStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), DomainError> {
        let expires_at_ms = now_millis().saturating_add(ttl.as_millis() as i64);
        self.map.insert(
            key.to_string(),
            Entry {
                value,
                expires_at_ms,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let Some(entry) = self.map.get(key) else {
            return Ok(None);
        };
        let now = now_millis();
        if entry.is_expired(now) {
            drop(entry);
            self.evict_if_expired(key, now);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn take(&self, key: &str) -> Result<Option<String>, DomainError> {
        // remove holds the shard write lock, so only one caller gets the entry
        let now = now_millis();
        Ok(self
            .map
            .remove(key)
            .filter(|(_, e)| !e.is_expired(now))
            .map(|(_, e)| e.value))
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.map.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError> {
        self.scan_matching(prefix, "").await
    }

    async fn scan_matching(
        &self,
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<(String, String)>, DomainError> {
        let now = now_millis();
        Ok(self
            .map
            .iter()
            .filter(|r| {
                let key = r.key();
                key.len() >= prefix.len() + suffix.len()
                    && key.starts_with(prefix)
                    && key.ends_with(suffix)
                    && !r.is_expired(now)
            })
            .map(|r| (r.key().clone(), r.value.clone()))
            .collect())
    }
}
