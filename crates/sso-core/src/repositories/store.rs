//! Keyed expiring store trait (port)

use async_trait::async_trait;
use std::time::Duration;

use crate::error::DomainError;

/// TTL key/value store shared by every server instance.
///
/// `get` and `take` never return an entry whose TTL has elapsed, and
/// `delete` of a missing key succeeds. `take` must be atomic per key: of
/// several concurrent callers at most one observes the value.
#[async_trait]
pub trait KeyedExpiringStore: Send + Sync {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), DomainError>;
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
    async fn take(&self, key: &str) -> Result<Option<String>, DomainError>;
    async fn delete(&self, key: &str) -> Result<(), DomainError>;
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError>;
    /// Entries whose key starts with `prefix` and ends with `suffix`. Backends
    /// push the match down so callers never walk the whole prefix.
    async fn scan_matching(
        &self,
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<(String, String)>, DomainError>;
}
