//! Client configuration, resolved once and never mutated

use ::config::{Config, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use sso_security::parse_absolute_url;
use sso_shared::constants::DEFAULT_CALLBACK_PATH;

use crate::error::ClientError;

/// Where the client keeps its session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenStorage {
    /// Persistent file per app id, survives restarts.
    #[default]
    LocalStorage,
    /// Process-wide map, gone when the process exits.
    SessionStorage,
    Cookie,
    Memory,
}

impl FromStr for TokenStorage {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "localstorage" | "local" => Ok(TokenStorage::LocalStorage),
            "sessionstorage" | "session" => Ok(TokenStorage::SessionStorage),
            "cookie" => Ok(TokenStorage::Cookie),
            "memory" => Ok(TokenStorage::Memory),
            other => Err(ClientError::Config(format!("unknown token storage '{}'", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSsoConfig {
    auth_server_url: String,
    app_url: String,
    app_id: String,
    callback_path: String,
    token_storage: String,
    storage_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SsoConfig {
    auth_server_url: Url,
    app_url: Url,
    app_id: String,
    callback_path: String,
    token_storage: TokenStorage,
    storage_dir: PathBuf,
}

impl SsoConfig {
    pub fn builder() -> SsoConfigBuilder {
        SsoConfigBuilder::default()
    }

    /// Read `SSO_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_environment(Environment::with_prefix("SSO"))
    }

    pub fn from_environment(env: Environment) -> Result<Self, ClientError> {
        let raw: RawSsoConfig = Config::builder()
            .set_default("callback_path", DEFAULT_CALLBACK_PATH)?
            .set_default("token_storage", "localStorage")?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        let mut builder = Self::builder()
            .auth_server_url(raw.auth_server_url)
            .app_url(raw.app_url)
            .app_id(raw.app_id)
            .callback_path(raw.callback_path)
            .token_storage(raw.token_storage.parse()?);
        if let Some(dir) = raw.storage_dir {
            builder = builder.storage_dir(dir);
        }
        builder.build()
    }

    pub fn auth_server_url(&self) -> &Url {
        &self.auth_server_url
    }

    pub fn app_url(&self) -> &Url {
        &self.app_url
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    pub fn token_storage(&self) -> TokenStorage {
        self.token_storage
    }

    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    /// Default redirect target: the app origin plus the callback path.
    pub fn redirect_uri(&self) -> Result<Url, ClientError> {
        self.app_url
            .join(&self.callback_path)
            .map_err(|e| ClientError::Config(e.to_string()))
    }

    /// URL on the auth server, `path` starting with `/`.
    pub fn server_url(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.auth_server_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, path)).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn login_page_url(&self, redirect_uri: &Url) -> Result<Url, ClientError> {
        let mut url = self.server_url("/login")?;
        url.query_pairs_mut()
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("app_id", &self.app_id);
        Ok(url)
    }

    pub fn logout_page_url(&self) -> Result<Url, ClientError> {
        let mut url = self.server_url("/logout")?;
        url.query_pairs_mut().append_pair("app_id", &self.app_id);
        Ok(url)
    }
}

#[derive(Debug, Default)]
pub struct SsoConfigBuilder {
    auth_server_url: Option<String>,
    app_url: Option<String>,
    app_id: Option<String>,
    callback_path: Option<String>,
    token_storage: TokenStorage,
    storage_dir: Option<PathBuf>,
}

impl SsoConfigBuilder {
    pub fn auth_server_url(mut self, url: impl Into<String>) -> Self {
        self.auth_server_url = Some(url.into());
        self
    }

    pub fn app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = Some(url.into());
        self
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = Some(path.into());
        self
    }

    pub fn token_storage(mut self, storage: TokenStorage) -> Self {
        self.token_storage = storage;
        self
    }

    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<SsoConfig, ClientError> {
        let auth_server_url = required_url("auth_server_url", self.auth_server_url)?;
        let app_url = required_url("app_url", self.app_url)?;

        let app_id = self.app_id.unwrap_or_default().trim().to_string();
        if app_id.is_empty() || app_id.contains(':') {
            return Err(ClientError::Config(
                "app_id must be non-empty and must not contain ':'".into(),
            ));
        }

        let callback_path = self
            .callback_path
            .unwrap_or_else(|| DEFAULT_CALLBACK_PATH.to_string());
        if !callback_path.starts_with('/') {
            return Err(ClientError::Config("callback_path must start with '/'".into()));
        }

        let storage_dir = self
            .storage_dir
            .unwrap_or_else(|| std::env::temp_dir().join("sso-client"));

        Ok(SsoConfig {
            auth_server_url,
            app_url,
            app_id,
            callback_path,
            token_storage: self.token_storage,
            storage_dir,
        })
    }
}

fn required_url(name: &str, value: Option<String>) -> Result<Url, ClientError> {
    let value = value.ok_or_else(|| ClientError::Config(format!("{} is required", name)))?;
    parse_absolute_url(&value).map_err(|e| ClientError::Config(format!("{}: {}", name, e)))
}
