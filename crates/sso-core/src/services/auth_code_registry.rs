// ============================================================================
// SSO Core - Authorization Code Registry
// File: crates/sso-core/src/services/auth_code_registry.rs
// ============================================================================
//! Issues and consumes one-time authorization codes

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use sso_security::{code_fingerprint, generate_auth_code};
use sso_shared::utils::now_millis;

use crate::domain::AuthCode;
use crate::error::DomainError;
use crate::keys::auth_code_key;
use crate::repositories::KeyedExpiringStore;

pub struct AuthCodeRegistry {
    store: Arc<dyn KeyedExpiringStore>,
    ttl: Duration,
}

impl AuthCodeRegistry {
    pub fn new(store: Arc<dyn KeyedExpiringStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh code bound to `(user_id, redirect_uri, app_id)`.
    pub async fn issue(
        &self,
        user_id: &str,
        redirect_uri: &str,
        app_id: &str,
    ) -> Result<String, DomainError> {
        let code = generate_auth_code();
        let record = AuthCode::new(
            code.clone(),
            user_id.to_string(),
            redirect_uri.to_string(),
            app_id.to_string(),
            now_millis() + self.ttl.as_millis() as i64,
        );
        let value = serde_json::to_string(&record)?;
        self.store.put(&auth_code_key(&code), value, self.ttl).await?;

        info!(
            user_id = %user_id,
            app_id = %app_id,
            code = %code_fingerprint(&code),
            "Authorization code issued"
        );
        Ok(code)
    }

    /// Fetch and delete in one atomic step. A second call for the same code
    /// always answers `InvalidCode`; an expired record is deleted as well.
    pub async fn consume(&self, code: &str) -> Result<AuthCode, DomainError> {
        if code.is_empty() {
            return Err(DomainError::InvalidCode);
        }

        let raw = self
            .store
            .take(&auth_code_key(code))
            .await?
            .ok_or_else(|| {
                debug!(code = %code_fingerprint(code), "Authorization code not found");
                DomainError::InvalidCode
            })?;
        let record: AuthCode = serde_json::from_str(&raw)?;

        if record.is_expired(now_millis()) {
            warn!(code = %code_fingerprint(code), "Authorization code used after expiry");
            return Err(DomainError::CodeExpired);
        }
        Ok(record)
    }

    /// `consume` plus an exact `redirect_uri` match. The code is spent even
    /// when the redirect URI does not match.
    pub async fn redeem(&self, code: &str, redirect_uri: &str) -> Result<AuthCode, DomainError> {
        let record = self.consume(code).await?;
        if record.redirect_uri != redirect_uri {
            warn!(
                app_id = %record.app_id,
                code = %code_fingerprint(code),
                "redirect_uri mismatch at code exchange"
            );
            return Err(DomainError::RedirectMismatch);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestStore;

    const CB: &str = "https://app.example/cb";

    fn registry() -> (Arc<TestStore>, AuthCodeRegistry) {
        let store = Arc::new(TestStore::default());
        let registry = AuthCodeRegistry::new(store.clone(), Duration::from_secs(300));
        (store, registry)
    }

    #[tokio::test]
    async fn test_issue_then_consume_once() {
        let (_, registry) = registry();
        let code = registry.issue("u1", CB, "energy").await.unwrap();

        let record = registry.redeem(&code, CB).await.unwrap();
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.redirect_uri, CB);
        assert_eq!(record.app_id, "energy");
        assert_eq!(record.code, code);

        let second = registry.redeem(&code, CB).await;
        assert!(matches!(second, Err(DomainError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_record_carries_expiry() {
        let (store, registry) = registry();
        let before = now_millis();
        let code = registry.issue("u1", CB, "energy").await.unwrap();

        let raw = store.raw(&auth_code_key(&code)).await.unwrap();
        let record: AuthCode = serde_json::from_str(&raw).unwrap();
        assert!(record.expires_at >= before + 300_000);
        assert!(record.expires_at <= now_millis() + 300_000);
    }

    #[tokio::test]
    async fn test_redirect_mismatch_spends_the_code() {
        let (_, registry) = registry();
        let code = registry.issue("u1", CB, "energy").await.unwrap();

        let mismatch = registry.redeem(&code, "https://app.example/other").await;
        assert!(matches!(mismatch, Err(DomainError::RedirectMismatch)));

        let retry = registry.redeem(&code, CB).await;
        assert!(matches!(retry, Err(DomainError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_expired_record_is_rejected_and_deleted() {
        let (store, registry) = registry();
        let record = AuthCode::new("stale".into(), "u1".into(), CB.into(), "energy".into(), now_millis() - 1);
        store
            .put(
                &auth_code_key("stale"),
                serde_json::to_string(&record).unwrap(),
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        assert!(matches!(registry.consume("stale").await, Err(DomainError::CodeExpired)));
        assert!(store.raw(&auth_code_key("stale")).await.is_none());
        assert!(matches!(registry.consume("stale").await, Err(DomainError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_evicted_code_is_invalid() {
        let (store, registry) = registry();
        store.put_expired(&auth_code_key("gone"), "{}".into()).await;
        assert!(matches!(registry.consume("gone").await, Err(DomainError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_unknown_and_empty_codes() {
        let (_, registry) = registry();
        assert!(matches!(registry.consume("nope").await, Err(DomainError::InvalidCode)));
        assert!(matches!(registry.consume("").await, Err(DomainError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_concurrent_consume_has_one_winner() {
        let (_, registry) = registry();
        let registry = Arc::new(registry);
        let code = registry.issue("u1", CB, "energy").await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let code = code.clone();
                tokio::spawn(async move { registry.consume(&code).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(DomainError::InvalidCode) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners, 1);
    }
}
