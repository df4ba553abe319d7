//! Configuration management

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::info;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_ACCOUNT_API_TIMEOUT, DEFAULT_AUTH_CODE_TTL,
    DEFAULT_COOKIE_MAX_AGE_DAYS, DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE, DEFAULT_SWEEP_INTERVAL,
};
use crate::error::AppError;
use crate::types::RuntimeEnv;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub store: StoreSettings,
    pub auth: AuthSettings,
    pub account_api: AccountApiSettings,
    pub cors: CorsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub redis_url: String,
    pub max_connections: usize,
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub code_ttl_seconds: u64,
    pub access_token_ttl_seconds: u64,
    pub cookie_max_age_days: i64,
    pub login_attempts_per_minute: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allow_localhost: bool,
}

impl AppConfig {
    /// Defaults, then `config/default`, then `config/{APP_ENV}`, then
    /// `SECTION__KEY` environment variables. `APP_ENV` picks the file and
    /// seeds `app.env`; a file value or `APP__ENV` still wins.
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::layered(&env)?
            .add_source(
                Environment::default()
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;
        let cfg: AppConfig = config.try_deserialize()?;
        cfg.validate()?;
        info!(env = %cfg.app.env, backend = ?cfg.store.backend, "Configuration loaded");
        Ok(cfg)
    }

    fn layered(env: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Self::defaults()?
            .set_default("app.env", env)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false)))
    }

    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "sso-server")?
            .set_default("store.backend", "memory")?
            .set_default("store.redis_url", "redis://127.0.0.1:6379")?
            .set_default("store.max_connections", 16)?
            .set_default("store.sweep_interval_seconds", DEFAULT_SWEEP_INTERVAL)?
            .set_default("auth.code_ttl_seconds", DEFAULT_AUTH_CODE_TTL)?
            .set_default("auth.access_token_ttl_seconds", DEFAULT_ACCESS_TOKEN_TTL)?
            .set_default("auth.cookie_max_age_days", DEFAULT_COOKIE_MAX_AGE_DAYS)?
            .set_default("auth.login_attempts_per_minute", DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE)?
            .set_default("account_api.base_url", "")?
            .set_default("account_api.timeout_seconds", DEFAULT_ACCOUNT_API_TIMEOUT)?
            .set_default("cors.allowed_origins", Vec::<String>::new())?
            .set_default("cors.allow_localhost", true)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.code_ttl_seconds == 0 {
            return Err(AppError::InvalidConfig("auth.code_ttl_seconds must be positive".into()));
        }
        if self.auth.access_token_ttl_seconds == 0 {
            return Err(AppError::InvalidConfig(
                "auth.access_token_ttl_seconds must be positive".into(),
            ));
        }
        if self.auth.login_attempts_per_minute == 0 {
            return Err(AppError::InvalidConfig(
                "auth.login_attempts_per_minute must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn runtime_env(&self) -> RuntimeEnv {
        RuntimeEnv::parse(&self.app.env)
    }
}
