// ============================================================================
// SSO Client - Relying Party Client
// File: crates/sso-client/src/client.rs
// ============================================================================
//! Drives the browser-side flow against the auth server.

use reqwest::cookie::Jar;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use url::Url;

use sso_core::domain::{LogoutType, TokenPair};
use sso_security::{is_same_origin, parse_absolute_url};
use sso_shared::constants::{APP_ID_HEADER, REFRESH_THRESHOLD_SECONDS};
use sso_shared::utils::now_millis;

use crate::config::SsoConfig;
use crate::error::ClientError;
use crate::navigator::Navigator;
use crate::session::ClientSession;
use crate::state::{AuthEvent, AuthState};
use crate::storage::SessionStorage;

const HTTP_TIMEOUT_SECONDS: u64 = 10;

#[derive(Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    #[serde(rename = "type")]
    logout_type: LogoutType,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

pub struct SsoClient {
    config: Arc<SsoConfig>,
    http: Client,
    storage: Box<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    cookies: Arc<Jar>,
    state: watch::Sender<AuthState>,
    refresh_lock: Mutex<()>,
}

impl SsoClient {
    /// Storage backend comes from the config's `token_storage`.
    pub fn new(config: SsoConfig, navigator: Arc<dyn Navigator>) -> Result<Self, ClientError> {
        let storage = config.token_storage().open(&config);
        Self::with_storage(config, storage, navigator)
    }

    pub fn with_storage(
        config: SsoConfig,
        storage: Box<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        Self::with_cookie_jar(config, storage, navigator, Arc::new(Jar::default()))
    }

    /// `cookies` carries the auth server's `user_id` cookie. Logout is
    /// resolved from that cookie, so hosts that hold it outside this client
    /// pass their jar here or call [`SsoClient::remember_auth_cookie`].
    pub fn with_cookie_jar(
        config: SsoConfig,
        storage: Box<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        cookies: Arc<Jar>,
    ) -> Result<Self, ClientError> {
        let initial = match storage.load()? {
            Some(session) if !session.is_expired(now_millis()) => AuthState::Authenticated(session),
            _ => AuthState::Unauthenticated,
        };
        let (state, _) = watch::channel(initial);

        Ok(Self {
            config: Arc::new(config),
            http: Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
                .cookie_provider(cookies.clone())
                .build()
                .map_err(|e| ClientError::Config(format!("HTTP client: {}", e)))?,
            storage,
            navigator,
            cookies,
            state,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &SsoConfig {
        &self.config
    }

    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.cookies
    }

    /// Record a `Set-Cookie` value issued by the auth server.
    pub fn remember_auth_cookie(&self, set_cookie: &str) -> Result<(), ClientError> {
        let url = self.config.server_url("/")?;
        self.cookies.add_cookie_str(set_cookie, &url);
        Ok(())
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn apply(&self, event: AuthEvent) {
        self.state.send_if_modified(|state| {
            match state.clone().transition(event) {
                Ok(next) if next != *state => {
                    *state = next;
                    true
                }
                Ok(_) => false,
                Err(e) => {
                    debug!("Ignoring state event: {}", e);
                    false
                }
            }
        });
    }

    /// Send the browser to the auth server's login page. The target must be
    /// on this app's origin; anything else fails before navigating.
    pub fn initiate_login(&self, redirect_uri: Option<&str>) -> Result<(), ClientError> {
        let target = match redirect_uri {
            Some(uri) => parse_absolute_url(uri)
                .map_err(|_| ClientError::InvalidRedirectUri(uri.to_string()))?,
            None => self.config.redirect_uri()?,
        };
        if !is_same_origin(&target, self.config.app_url()) {
            warn!(redirect_uri = %target, "Refusing cross-origin redirect target");
            return Err(ClientError::InvalidRedirectUri(target.to_string()));
        }

        let login_url = self.config.login_page_url(&target)?;
        self.apply(AuthEvent::LoginStarted);
        info!(app_id = %self.config.app_id(), "Redirecting to SSO login");
        self.navigator.navigate(&login_url);
        Ok(())
    }

    /// Complete the flow from the URL the auth server redirected back to.
    pub async fn handle_callback(&self, callback_url: &str) -> Result<ClientSession, ClientError> {
        let url = Url::parse(callback_url).map_err(|e| ClientError::Sso(e.to_string()))?;

        let mut code = None;
        let mut error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            self.apply(AuthEvent::Failed(error.clone()));
            return Err(ClientError::Sso(error));
        }
        let code = code.filter(|c| !c.is_empty()).ok_or(ClientError::MissingCode)?;

        let redirect_uri = format!("{}{}", url.origin().ascii_serialization(), url.path());
        self.apply(AuthEvent::CallbackReceived);
        self.exchange_code(&code, &redirect_uri).await
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ClientSession, ClientError> {
        let result = self
            .post_tokens("/api/auth/token", &TokenRequest { code, redirect_uri })
            .await;
        let tokens = match result {
            Ok(tokens) => tokens,
            Err(e) => {
                self.apply(AuthEvent::Failed(e.to_string()));
                return Err(e);
            }
        };

        let session = ClientSession::from_tokens(tokens, now_millis());
        self.storage.save(&session)?;
        self.apply(AuthEvent::SessionEstablished(session.clone()));
        info!(app_id = %self.config.app_id(), "SSO session established");
        Ok(session)
    }

    /// Cached access token, refreshed first when it expires within five
    /// minutes. A failed refresh ends the local session and yields `None`.
    pub async fn get_access_token(&self) -> Result<Option<String>, ClientError> {
        let Some(session) = self.storage.load()? else {
            return Ok(None);
        };
        if !session.expires_within(REFRESH_THRESHOLD_SECONDS, now_millis()) {
            return Ok(Some(session.access_token));
        }

        match self.refresh_token().await {
            Ok(fresh) => Ok(Some(fresh.access_token)),
            Err(e) => {
                warn!("Token refresh failed, clearing local session: {}", e);
                self.clear_local()?;
                Ok(None)
            }
        }
    }

    /// Exchange the stored refresh token for a new pair. Concurrent callers
    /// share one request: whoever waited on the lock reuses the result.
    pub async fn refresh_token(&self) -> Result<ClientSession, ClientError> {
        let seen = self.storage.load()?.ok_or(ClientError::NotAuthenticated)?;
        let _guard = self.refresh_lock.lock().await;

        let current = self.storage.load()?.ok_or(ClientError::NotAuthenticated)?;
        if current != seen {
            debug!("Session refreshed by a concurrent caller");
            return Ok(current);
        }

        self.apply(AuthEvent::RefreshStarted);
        let result = self
            .post_tokens(
                "/api/auth/refresh",
                &RefreshRequest {
                    refresh_token: &current.refresh_token,
                },
            )
            .await;
        let tokens = match result {
            Ok(tokens) => tokens,
            Err(e) => {
                self.apply(AuthEvent::Failed(e.to_string()));
                return Err(e);
            }
        };

        let session = ClientSession::from_tokens(tokens, now_millis());
        self.storage.save(&session)?;
        self.apply(AuthEvent::Refreshed(session.clone()));
        debug!(expires_at = session.expires_at, "Access token refreshed");
        Ok(session)
    }

    /// The server call is best effort; the local session is always
    /// cleared. Global logout also leaves for the auth server's logout page.
    pub async fn logout(&self, logout_type: LogoutType) -> Result<(), ClientError> {
        let session = self.storage.load().unwrap_or_else(|e| {
            warn!("Could not read session before logout: {}", e);
            None
        });

        if let Err(e) = self.post_logout(logout_type, session.as_ref()).await {
            warn!(logout_type = logout_type.as_str(), "Server logout failed: {}", e);
        }

        self.clear_local()?;
        info!(logout_type = logout_type.as_str(), "Logged out");

        if logout_type == LogoutType::Global {
            self.navigator.navigate(&self.config.logout_page_url()?);
        }
        Ok(())
    }

    /// Re-read the stored session and publish what it says. Never refreshes.
    pub fn check_session(&self) -> AuthState {
        match self.storage.load() {
            Ok(Some(session)) if !session.is_expired(now_millis()) => {
                if self.state.borrow().session() != Some(&session) {
                    self.apply(AuthEvent::SessionEstablished(session));
                }
            }
            Ok(_) => self.apply(AuthEvent::SessionExpired),
            Err(e) => warn!("Session check failed: {}", e),
        }
        self.state()
    }

    fn clear_local(&self) -> Result<(), ClientError> {
        self.storage.clear()?;
        self.apply(AuthEvent::LoggedOut);
        Ok(())
    }

    async fn post_tokens<B: Serialize>(&self, path: &str, body: &B) -> Result<TokenPair, ClientError> {
        let response = self
            .http
            .post(self.config.server_url(path)?)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<TokenPair>()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    }

    async fn post_logout(
        &self,
        logout_type: LogoutType,
        session: Option<&ClientSession>,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.config.server_url("/api/auth/logout")?)
            .header(APP_ID_HEADER, self.config.app_id())
            .json(&LogoutRequest {
                logout_type,
                refresh_token: session.map(|s| s.refresh_token.as_str()),
            })
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    Err(ClientError::Server {
        status: status.as_u16(),
        error: body.error,
        message: body.message,
    })
}
