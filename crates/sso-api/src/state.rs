use std::sync::Arc;

use sso_core::AuthService;
use sso_security::OriginPolicy;
use sso_shared::config::AppConfig;

use crate::throttle::LoginLimiter;

#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub max_age_days: i64,
    pub secure: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub login_limiter: Arc<LoginLimiter>,
    pub cookie: CookieSettings,
    pub origins: OriginPolicy,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, config: &AppConfig) -> Self {
        Self {
            auth,
            login_limiter: Arc::new(LoginLimiter::new(config.auth.login_attempts_per_minute)),
            cookie: CookieSettings {
                max_age_days: config.auth.cookie_max_age_days,
                secure: config.runtime_env().is_production(),
            },
            origins: OriginPolicy::new(
                config.cors.allowed_origins.clone(),
                config.cors.allow_localhost,
            ),
        }
    }
}
