//! Redis-backed TTL store shared by every server instance

use async_trait::async_trait;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use std::time::Duration;
use tracing::{error, info};

use sso_core::{DomainError, KeyedExpiringStore};

const SCAN_BATCH: usize = 100;

pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build the pool and verify the server answers before returning.
    pub async fn connect(url: &str, max_connections: usize) -> Result<Self, DomainError> {
        let mut config = Config::from_url(url);
        config.pool = Some(PoolConfig::new(max_connections.max(1)));
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DomainError::StorageError(format!("Failed to create Redis pool: {}", e)))?;

        let store = Self { pool };
        let mut conn = store.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(storage_error)?;

        info!(max_connections, "Connected to Redis");
        Ok(store)
    }

    pub fn close(&self) {
        self.pool.close();
        info!("Redis pool closed");
    }

    async fn conn(&self) -> Result<Connection, DomainError> {
        self.pool.get().await.map_err(|e| {
            error!("Redis connection unavailable: {}", e);
            DomainError::StorageError(e.to_string())
        })
    }
}

fn storage_error(e: redis::RedisError) -> DomainError {
    error!("Redis command failed: {}", e);
    DomainError::StorageError(e.to_string())
}

/// `SCAN MATCH` glob for keys starting with `prefix` and ending with
/// `suffix`; both parts are matched literally.
fn match_pattern(prefix: &str, suffix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + suffix.len() + 1);
    push_escaped(&mut pattern, prefix);
    pattern.push('*');
    push_escaped(&mut pattern, suffix);
    pattern
}

fn push_escaped(pattern: &mut String, literal: &str) {
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
}

#[async_trait]
impl KeyedExpiringStore for RedisStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.conn().await?;
        let millis = (ttl.as_millis() as u64).max(1);
        conn.pset_ex::<_, _, ()>(key, value, millis)
            .await
            .map_err(storage_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(storage_error)
    }

    async fn take(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.conn().await?;
        redis::cmd("GETDEL")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(storage_error)
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key).await.map_err(storage_error)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, DomainError> {
        self.scan_matching(prefix, "").await
    }

    async fn scan_matching(
        &self,
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<(String, String)>, DomainError> {
        let mut conn = self.conn().await?;
        let pattern = match_pattern(prefix, suffix);

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(storage_error)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may repeat keys across iterations
        keys.sort();
        keys.dedup();

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            // a key can expire between SCAN and GET
            if let Some(value) = conn
                .get::<_, Option<String>>(&key)
                .await
                .map_err(storage_error)?
            {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_pattern_escapes_glob_characters() {
        assert_eq!(match_pattern("app_session:", ""), "app_session:*");
        assert_eq!(match_pattern("a*b?[c]", ""), "a\\*b\\?\\[c\\]*");
    }

    #[test]
    fn test_match_pattern_with_user_suffix() {
        assert_eq!(match_pattern("app_session:", ":u1"), "app_session:*:u1");
        assert_eq!(match_pattern("app_session:", ":u*1"), "app_session:*:u\\*1");
    }

    #[tokio::test]
    async fn test_connect_fails_without_server() {
        let result = RedisStore::connect("redis://127.0.0.1:1", 1).await;
        assert!(matches!(result, Err(DomainError::StorageError(_))));
    }
}
