//! Global and per-app session registry

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use sso_shared::constants::APP_SESSION_KEY_PREFIX;

use crate::domain::SessionRecord;
use crate::error::DomainError;
use crate::keys::{app_id_for_user, app_session_key, session_key};
use crate::repositories::KeyedExpiringStore;

/// Sessions are written twice: once globally per user ("signed in
/// somewhere") and once per `(app_id, user_id)`.
pub struct SessionRegistry {
    store: Arc<dyn KeyedExpiringStore>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn KeyedExpiringStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn create_global(
        &self,
        user_id: &str,
        session: &SessionRecord,
    ) -> Result<(), DomainError> {
        let value = serde_json::to_string(session)?;
        self.store.put(&session_key(user_id), value, self.ttl).await
    }

    pub async fn create_local(
        &self,
        app_id: &str,
        user_id: &str,
        session: &SessionRecord,
    ) -> Result<(), DomainError> {
        let mut record = session.clone();
        record.app_id = Some(app_id.to_string());
        let value = serde_json::to_string(&record)?;
        self.store
            .put(&app_session_key(app_id, user_id), value, self.ttl)
            .await
    }

    pub async fn get_session(&self, user_id: &str) -> Result<Option<SessionRecord>, DomainError> {
        self.load(&session_key(user_id)).await
    }

    pub async fn get_app_session(
        &self,
        app_id: &str,
        user_id: &str,
    ) -> Result<Option<SessionRecord>, DomainError> {
        self.load(&app_session_key(app_id, user_id)).await
    }

    /// Every live per-app session of `user_id`.
    pub async fn list_local_sessions(
        &self,
        user_id: &str,
    ) -> Result<Vec<(String, SessionRecord)>, DomainError> {
        let entries = self.scan_user_sessions(user_id).await?;
        let mut sessions = Vec::new();
        for (key, value) in entries {
            if let Some(app_id) = app_id_for_user(&key, user_id) {
                let record: SessionRecord = serde_json::from_str(&value)?;
                sessions.push((app_id.to_string(), record));
            }
        }
        sessions.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(sessions)
    }

    /// Remove exactly `(app_id, user_id)`.
    pub async fn revoke_local(&self, app_id: &str, user_id: &str) -> Result<(), DomainError> {
        self.store.delete(&app_session_key(app_id, user_id)).await?;
        info!(user_id = %user_id, app_id = %app_id, "Local session revoked");
        Ok(())
    }

    /// Remove the global session and every per-app session of the user.
    /// Returns the app ids whose sessions were removed. Any store failure
    /// aborts the logout.
    pub async fn revoke_global(&self, user_id: &str) -> Result<Vec<String>, DomainError> {
        self.store.delete(&session_key(user_id)).await?;

        let entries = self.scan_user_sessions(user_id).await?;
        let mut revoked = Vec::new();
        for (key, _) in entries {
            let Some(app_id) = app_id_for_user(&key, user_id) else {
                continue;
            };
            if let Err(e) = self.store.delete(&key).await {
                error!(user_id = %user_id, app_id = %app_id, "Global logout interrupted: {}", e);
                return Err(e);
            }
            revoked.push(app_id.to_string());
        }
        revoked.sort();

        info!(user_id = %user_id, apps = ?revoked, "Global session revoked");
        Ok(revoked)
    }

    /// `app_session:*:{user_id}`, matched by the store.
    async fn scan_user_sessions(
        &self,
        user_id: &str,
    ) -> Result<Vec<(String, String)>, DomainError> {
        self.store
            .scan_matching(APP_SESSION_KEY_PREFIX, &format!(":{user_id}"))
            .await
    }

    async fn load(&self, key: &str) -> Result<Option<SessionRecord>, DomainError> {
        match self.store.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestStore;

    fn session(token: &str) -> SessionRecord {
        SessionRecord {
            access_token: format!("at-{token}"),
            refresh_token: format!("rt-{token}"),
            expires_at: 4_102_444_800_000,
            app_id: None,
        }
    }

    fn registry() -> (Arc<TestStore>, SessionRegistry) {
        let store = Arc::new(TestStore::default());
        let registry = SessionRegistry::new(store.clone(), Duration::from_secs(3600));
        (store, registry)
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let (_, registry) = registry();
        registry.create_global("u1", &session("g")).await.unwrap();
        registry.create_local("energy", "u1", &session("e")).await.unwrap();

        assert_eq!(registry.get_session("u1").await.unwrap(), Some(session("g")));
        let local = registry.get_app_session("energy", "u1").await.unwrap().unwrap();
        assert_eq!(local.access_token, "at-e");
        assert_eq!(local.app_id.as_deref(), Some("energy"));
    }

    #[tokio::test]
    async fn test_revoke_global_removes_every_local_session() {
        let (_, registry) = registry();
        registry.create_global("u1", &session("g")).await.unwrap();
        registry.create_local("energy", "u1", &session("e")).await.unwrap();
        registry.create_local("social", "u1", &session("s")).await.unwrap();
        registry.create_local("energy", "u2", &session("other")).await.unwrap();

        let revoked = registry.revoke_global("u1").await.unwrap();
        assert_eq!(revoked, vec!["energy".to_string(), "social".to_string()]);

        assert!(registry.get_session("u1").await.unwrap().is_none());
        assert!(registry.get_app_session("energy", "u1").await.unwrap().is_none());
        assert!(registry.get_app_session("social", "u1").await.unwrap().is_none());
        assert!(registry.get_app_session("energy", "u2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_local_is_targeted() {
        let (_, registry) = registry();
        registry.create_global("u1", &session("g")).await.unwrap();
        registry.create_local("energy", "u1", &session("e")).await.unwrap();
        registry.create_local("social", "u1", &session("s")).await.unwrap();
        registry.create_local("energy", "u2", &session("x")).await.unwrap();

        registry.revoke_local("energy", "u1").await.unwrap();

        assert!(registry.get_app_session("energy", "u1").await.unwrap().is_none());
        assert!(registry.get_app_session("social", "u1").await.unwrap().is_some());
        assert!(registry.get_app_session("energy", "u2").await.unwrap().is_some());
        assert!(registry.get_session("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revocation_is_idempotent() {
        let (_, registry) = registry();
        registry.revoke_local("energy", "nobody").await.unwrap();
        assert!(registry.revoke_global("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_local_sessions() {
        let (_, registry) = registry();
        registry.create_local("social", "u1", &session("s")).await.unwrap();
        registry.create_local("energy", "u1", &session("e")).await.unwrap();
        registry.create_local("energy", "u10", &session("x")).await.unwrap();

        let sessions = registry.list_local_sessions("u1").await.unwrap();
        let apps: Vec<_> = sessions.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(apps, vec!["energy", "social"]);
    }

    #[tokio::test]
    async fn test_scans_are_scoped_to_the_user() {
        let (store, registry) = registry();
        registry.create_local("energy", "u1", &session("e")).await.unwrap();
        registry.create_local("energy", "u2", &session("x")).await.unwrap();

        registry.list_local_sessions("u1").await.unwrap();
        registry.revoke_global("u1").await.unwrap();

        assert_eq!(
            store.scans().await,
            vec!["app_session:*:u1".to_string(), "app_session:*:u1".to_string()]
        );
        assert!(registry.get_app_session("energy", "u2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_failure_mid_scan_is_fatal() {
        let (store, registry) = registry();
        registry.create_global("u1", &session("g")).await.unwrap();
        registry.create_local("energy", "u1", &session("e")).await.unwrap();
        registry.create_local("social", "u1", &session("s")).await.unwrap();

        // global delete and one local delete succeed, then the store fails
        store.fail_deletes_after(2).await;
        let result = registry.revoke_global("u1").await;
        assert!(matches!(result, Err(DomainError::StorageError(_))));
    }
}
