// ============================================================================
// SSO Core - Authentication Service
// File: crates/sso-core/src/services/auth_service.rs
// ============================================================================
//! Orchestrates login, code issuance, code exchange, refresh and logout
//! against the code/session registries and the Account API.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use sso_security::parse_absolute_url;
use sso_shared::utils::{expiry_after, mask_identifier, now_millis};

use crate::domain::{LogoutType, SessionRecord, TokenPair};
use crate::error::DomainError;
use crate::events::{RevocationScope, SessionEventPublisher, SessionRevoked};
use crate::repositories::{AccountApi, KeyedExpiringStore};
use crate::services::{AuthCodeRegistry, SessionRegistry};

/// Where the relying party wants the code delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeTarget {
    pub redirect_uri: String,
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user_id: String,
    /// `redirect_uri?code=...` when the login carried an authorize target.
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LogoutRequest {
    pub logout_type: LogoutType,
    pub app_id: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub logout_type: LogoutType,
    pub revoked_apps: Vec<String>,
}

pub struct AuthService {
    codes: AuthCodeRegistry,
    sessions: SessionRegistry,
    account_api: Arc<dyn AccountApi>,
    events: Arc<dyn SessionEventPublisher>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn KeyedExpiringStore>,
        account_api: Arc<dyn AccountApi>,
        events: Arc<dyn SessionEventPublisher>,
        code_ttl: Duration,
        session_ttl: Duration,
    ) -> Self {
        Self {
            codes: AuthCodeRegistry::new(store.clone(), code_ttl),
            sessions: SessionRegistry::new(store, session_ttl),
            account_api,
            events,
        }
    }

    pub fn codes(&self) -> &AuthCodeRegistry {
        &self.codes
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Check credentials with the Account API. With an authorize target the
    /// code is issued in the same call and the callback URL returned.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        target: Option<&AuthorizeTarget>,
    ) -> Result<LoginOutcome, DomainError> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(DomainError::ValidationError(
                "identifier and password are required".into(),
            ));
        }
        let target = target.map(normalize_target).transpose()?;

        let user_id = self
            .account_api
            .authenticate(identifier, password)
            .await
            .inspect_err(|e| {
                warn!(identifier = %mask_identifier(identifier), "Login failed: {}", e);
            })?;
        info!(user_id = %user_id, "Login successful");

        let redirect_url = match &target {
            Some(target) => {
                let code = self
                    .codes
                    .issue(&user_id, &target.redirect_uri, &target.app_id)
                    .await?;
                Some(callback_url(&target.redirect_uri, &code)?)
            }
            None => None,
        };

        Ok(LoginOutcome {
            user_id,
            redirect_url,
        })
    }

    /// Issue a code for an already signed-in user.
    pub async fn issue_code(
        &self,
        user_id: Option<&str>,
        target: &AuthorizeTarget,
    ) -> Result<String, DomainError> {
        let user_id = require_user(user_id)?;
        let target = normalize_target(target)?;
        self.codes
            .issue(user_id, &target.redirect_uri, &target.app_id)
            .await
    }

    /// Redeem a code for a token pair and record the global and app
    /// sessions. A code yields tokens at most once.
    pub async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<TokenPair, DomainError> {
        let record = self.codes.redeem(code, redirect_uri).await?;
        let tokens = self.account_api.issue_tokens(&record.user_id).await?;

        let session = SessionRecord {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: expiry_after(now_millis(), tokens.expires_in),
            app_id: None,
        };
        self.sessions.create_global(&record.user_id, &session).await?;
        self.sessions
            .create_local(&record.app_id, &record.user_id, &session)
            .await?;

        info!(user_id = %record.user_id, app_id = %record.app_id, "Tokens issued");
        Ok(tokens)
    }

    /// Forwarded to the Account API; refresh tokens are opaque here.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        if refresh_token.is_empty() {
            return Err(DomainError::ValidationError("refresh_token is required".into()));
        }
        self.account_api.refresh(refresh_token).await
    }

    /// Store revocation must complete before success is returned; the
    /// remote refresh-token revoke is best effort.
    pub async fn logout(
        &self,
        user_id: Option<&str>,
        request: LogoutRequest,
    ) -> Result<LogoutOutcome, DomainError> {
        let user_id = require_user(user_id)?;

        let revoked_apps = match request.logout_type {
            LogoutType::Local => {
                let app_id = request
                    .app_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .ok_or(DomainError::MissingAppId)?;
                self.sessions.revoke_local(app_id, user_id).await?;
                self.events.publish(SessionRevoked {
                    user_id: user_id.to_string(),
                    app_id: Some(app_id.to_string()),
                    scope: RevocationScope::Local,
                });
                vec![app_id.to_string()]
            }
            LogoutType::Global => {
                let revoked = self.sessions.revoke_global(user_id).await?;
                for app_id in &revoked {
                    self.events.publish(SessionRevoked {
                        user_id: user_id.to_string(),
                        app_id: Some(app_id.clone()),
                        scope: RevocationScope::Global,
                    });
                }
                self.events.publish(SessionRevoked {
                    user_id: user_id.to_string(),
                    app_id: None,
                    scope: RevocationScope::Global,
                });
                revoked
            }
        };

        if let Some(token) = request.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            if let Err(e) = self.account_api.revoke(token).await {
                warn!(user_id = %user_id, "Remote token revoke failed, continuing logout: {}", e);
            }
        }

        info!(
            user_id = %user_id,
            logout_type = request.logout_type.as_str(),
            "Logout completed"
        );
        Ok(LogoutOutcome {
            logout_type: request.logout_type,
            revoked_apps,
        })
    }
}

fn require_user(user_id: Option<&str>) -> Result<&str, DomainError> {
    user_id
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(DomainError::Unauthenticated)
}

/// Validate the target and return it with `app_id` trimmed, the same form
/// local logout uses to address the app session.
fn normalize_target(target: &AuthorizeTarget) -> Result<AuthorizeTarget, DomainError> {
    parse_absolute_url(&target.redirect_uri)
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
    let app_id = target.app_id.trim();
    if app_id.is_empty() {
        return Err(DomainError::ValidationError("app_id is required".into()));
    }
    if app_id.contains(':') {
        return Err(DomainError::ValidationError("app_id must not contain ':'".into()));
    }
    Ok(AuthorizeTarget {
        redirect_uri: target.redirect_uri.clone(),
        app_id: app_id.to_string(),
    })
}

fn callback_url(redirect_uri: &str, code: &str) -> Result<String, DomainError> {
    let mut url = Url::parse(redirect_uri)
        .map_err(|e| DomainError::InternalError(format!("callback url: {}", e)))?;
    url.query_pairs_mut().append_pair("code", code);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::repositories::MockAccountApi;
    use crate::test_support::TestStore;

    const CB: &str = "https://app.example/cb";

    fn tokens(tag: &str) -> TokenPair {
        TokenPair {
            access_token: format!("at-{tag}"),
            refresh_token: format!("rt-{tag}"),
            expires_in: 3600,
        }
    }

    fn service(api: MockAccountApi) -> (AuthService, Arc<EventBus>) {
        let bus = Arc::new(EventBus::new(32));
        let service = AuthService::new(
            Arc::new(TestStore::default()),
            Arc::new(api),
            bus.clone(),
            Duration::from_secs(300),
            Duration::from_secs(3600),
        );
        (service, bus)
    }

    fn target(app_id: &str) -> AuthorizeTarget {
        AuthorizeTarget {
            redirect_uri: CB.into(),
            app_id: app_id.into(),
        }
    }

    #[tokio::test]
    async fn test_login_without_target() {
        let mut api = MockAccountApi::new();
        api.expect_authenticate()
            .withf(|id, pw| id == "budi@example.com" && pw == "secret")
            .returning(|_, _| Ok("u1".to_string()));
        let (service, _) = service(api);

        let outcome = service.login("budi@example.com", "secret", None).await.unwrap();
        assert_eq!(outcome.user_id, "u1");
        assert!(outcome.redirect_url.is_none());
    }

    #[tokio::test]
    async fn test_login_with_target_returns_usable_callback() {
        let mut api = MockAccountApi::new();
        api.expect_authenticate().returning(|_, _| Ok("u1".to_string()));
        api.expect_issue_tokens()
            .withf(|user| user == "u1")
            .times(1)
            .returning(|_| Ok(tokens("1")));
        let (service, _) = service(api);

        let outcome = service
            .login("budi@example.com", "secret", Some(&target("energy")))
            .await
            .unwrap();
        let url = Url::parse(outcome.redirect_url.as_deref().unwrap()).unwrap();
        assert_eq!(url.path(), "/cb");
        let code = url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        let pair = service.exchange(&code, CB).await.unwrap();
        assert_eq!(pair, tokens("1"));
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let mut api = MockAccountApi::new();
        api.expect_authenticate()
            .returning(|_, _| Err(DomainError::InvalidCredentials));
        let (service, _) = service(api);

        let result = service.login("budi@example.com", "wrong", None).await;
        assert!(matches!(result, Err(DomainError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_target_before_calling_account_api() {
        let mut api = MockAccountApi::new();
        api.expect_authenticate().never();
        let (service, _) = service(api);

        let bad = AuthorizeTarget {
            redirect_uri: "/relative".into(),
            app_id: "energy".into(),
        };
        let result = service.login("budi@example.com", "secret", Some(&bad)).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_issue_code_requires_user() {
        let (service, _) = service(MockAccountApi::new());
        let result = service.issue_code(None, &target("energy")).await;
        assert!(matches!(result, Err(DomainError::Unauthenticated)));
        let result = service.issue_code(Some(""), &target("energy")).await;
        assert!(matches!(result, Err(DomainError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_issue_code_validates_app_id() {
        let (service, _) = service(MockAccountApi::new());
        let result = service.issue_code(Some("u1"), &target(" ")).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
        let result = service.issue_code(Some("u1"), &target("a:b")).await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_exchange_records_sessions() {
        let mut api = MockAccountApi::new();
        api.expect_issue_tokens().returning(|_| Ok(tokens("x")));
        let (service, _) = service(api);

        let code = service.issue_code(Some("u1"), &target("energy")).await.unwrap();
        service.exchange(&code, CB).await.unwrap();

        let global = service.sessions().get_session("u1").await.unwrap().unwrap();
        assert_eq!(global.access_token, "at-x");
        let local = service
            .sessions()
            .get_app_session("energy", "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(local.refresh_token, "rt-x");
        assert!(local.expires_at > now_millis());
    }

    #[tokio::test]
    async fn test_padded_app_id_is_stored_trimmed() {
        let mut api = MockAccountApi::new();
        api.expect_issue_tokens().returning(|_| Ok(tokens("x")));
        let (service, _) = service(api);

        let code = service.issue_code(Some("u1"), &target(" energy ")).await.unwrap();
        service.exchange(&code, CB).await.unwrap();
        assert!(service
            .sessions()
            .get_app_session("energy", "u1")
            .await
            .unwrap()
            .is_some());

        service
            .logout(
                Some("u1"),
                LogoutRequest {
                    logout_type: LogoutType::Local,
                    app_id: Some("energy".into()),
                    refresh_token: None,
                },
            )
            .await
            .unwrap();
        assert!(service
            .sessions()
            .get_app_session("energy", "u1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_huge_token_lifetime_saturates_session_expiry() {
        let mut api = MockAccountApi::new();
        api.expect_issue_tokens().returning(|_| {
            Ok(TokenPair {
                access_token: "at".into(),
                refresh_token: "rt".into(),
                expires_in: 18_446_744_073_709_551,
            })
        });
        let (service, _) = service(api);

        let code = service.issue_code(Some("u1"), &target("energy")).await.unwrap();
        service.exchange(&code, CB).await.unwrap();
        let global = service.sessions().get_session("u1").await.unwrap().unwrap();
        assert_eq!(global.expires_at, i64::MAX);
    }

    #[tokio::test]
    async fn test_code_never_yields_tokens_twice() {
        let mut api = MockAccountApi::new();
        api.expect_issue_tokens().times(1).returning(|_| Ok(tokens("x")));
        let (service, _) = service(api);

        let code = service.issue_code(Some("u1"), &target("energy")).await.unwrap();
        assert!(service.exchange(&code, CB).await.is_ok());
        assert!(matches!(
            service.exchange(&code, CB).await,
            Err(DomainError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_exchange_with_other_redirect_is_rejected() {
        let mut api = MockAccountApi::new();
        api.expect_issue_tokens().never();
        let (service, _) = service(api);

        let code = service.issue_code(Some("u1"), &target("energy")).await.unwrap();
        let result = service.exchange(&code, "https://app.example/other").await;
        assert!(matches!(result, Err(DomainError::RedirectMismatch)));
    }

    #[tokio::test]
    async fn test_refresh_passthrough() {
        let mut api = MockAccountApi::new();
        api.expect_refresh()
            .withf(|rt| rt == "rt-1")
            .returning(|_| Ok(tokens("2")));
        api.expect_refresh()
            .withf(|rt| rt == "revoked")
            .returning(|_| {
                Err(DomainError::CollaboratorRejected {
                    status: 401,
                    message: "refresh token revoked".into(),
                })
            });
        let (service, _) = service(api);

        assert_eq!(service.refresh("rt-1").await.unwrap(), tokens("2"));
        assert!(matches!(
            service.refresh("revoked").await,
            Err(DomainError::CollaboratorRejected { status: 401, .. })
        ));
        assert!(matches!(
            service.refresh("").await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_local_logout_requires_app_id() {
        let (service, _) = service(MockAccountApi::new());
        let request = LogoutRequest {
            logout_type: LogoutType::Local,
            app_id: None,
            refresh_token: None,
        };
        let result = service.logout(Some("u1"), request).await;
        assert!(matches!(result, Err(DomainError::MissingAppId)));
    }

    #[tokio::test]
    async fn test_logout_requires_user() {
        let (service, _) = service(MockAccountApi::new());
        let request = LogoutRequest {
            logout_type: LogoutType::Global,
            app_id: None,
            refresh_token: None,
        };
        let result = service.logout(None, request).await;
        assert!(matches!(result, Err(DomainError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_global_logout_publishes_per_app_events() {
        let mut api = MockAccountApi::new();
        api.expect_issue_tokens().returning(|_| Ok(tokens("x")));
        api.expect_revoke().returning(|_| {
            Err(DomainError::CollaboratorUnavailable("timeout".into()))
        });
        let (service, bus) = service(api);
        let mut rx = bus.subscribe();

        for app in ["energy", "social"] {
            let code = service.issue_code(Some("u1"), &target(app)).await.unwrap();
            service.exchange(&code, CB).await.unwrap();
        }

        let outcome = service
            .logout(
                Some("u1"),
                LogoutRequest {
                    logout_type: LogoutType::Global,
                    app_id: None,
                    refresh_token: Some("rt-x".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.revoked_apps, vec!["energy", "social"]);
        assert!(service.sessions().get_session("u1").await.unwrap().is_none());

        let mut apps = Vec::new();
        for _ in 0..3 {
            apps.push(rx.recv().await.unwrap().app_id);
        }
        assert_eq!(
            apps,
            vec![Some("energy".to_string()), Some("social".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (service, _) = service(MockAccountApi::new());
        let request = LogoutRequest {
            logout_type: LogoutType::Local,
            app_id: Some("energy".into()),
            refresh_token: None,
        };
        let outcome = service.logout(Some("u1"), request.clone()).await.unwrap();
        assert_eq!(outcome.revoked_apps, vec!["energy"]);
        assert!(service.logout(Some("u1"), request).await.is_ok());
    }
}
