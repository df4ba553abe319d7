//! In-memory store used by the service tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::DomainError;
use crate::repositories::KeyedExpiringStore;

#[derive(Default)]
pub struct TestStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    fail_deletes_after: Mutex<Option<usize>>,
    scans: Mutex<Vec<String>>,
}

impl TestStore {
    /// Make every `delete` after the first `n` fail.
    pub async fn fail_deletes_after(&self, n: usize) {
        *self.fail_deletes_after.lock().await = Some(n);
    }

    /// Insert a value whose TTL has already elapsed.
    pub async fn put_expired(&self, key: &str, value: String) {
        let past = Instant::now() - Duration::from_millis(1);
        self.entries.lock().await.insert(key.to_string(), (value, past));
    }

    /// Every scan issued so far, as `prefix*suffix`.
    pub async fn scans(&self) -> Vec<String> {
        self.scans.lock().await.clone()
    }

    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).map(|(v, _)| v.clone())
    }
}

#[async_trait]
impl KeyedExpiringStore for TestStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), DomainError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|(_, exp)| *exp > Instant::now())
            .map(|(v, _)| v.clone()))
    }

    async fn take(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .remove(key)
            .filter(|(_, exp)| *exp > Instant::now())
            .map(|(v, _)| v))
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let mut budget = self.fail_deletes_after.lock().await;
        if let Some(remaining) = budget.as_mut() {
            if *remaining == 0 {
                return Err(DomainError::StorageError("connection reset".into()));
            }
            *remaining -= 1;
        }
        self.entries.lock().await.remove(key);
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
        self.scans.lock().await.push(format!("{prefix}*{suffix}"));
        let now = Instant::now();
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(k, (_, exp))| {
                k.len() >= prefix.len() + suffix.len()
                    && k.starts_with(prefix)
                    && k.ends_with(suffix)
                    && *exp > now
            })
            .map(|(k, (v, _))| (k.clone(), v.clone()))
            .collect())
    }
}
