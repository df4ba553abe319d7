//! Application-wide constants

/// Store key prefix for one-time authorization codes: `auth_code:{code}`.
pub const AUTH_CODE_KEY_PREFIX: &str = "auth_code:";
/// Store key prefix for global sessions: `session:{user_id}`.
pub const SESSION_KEY_PREFIX: &str = "session:";
/// Store key prefix for per-app sessions: `app_session:{app_id}:{user_id}`.
pub const APP_SESSION_KEY_PREFIX: &str = "app_session:";

pub const USER_ID_COOKIE: &str = "user_id";
pub const APP_ID_HEADER: &str = "x-app-id";

pub const DEFAULT_AUTH_CODE_TTL: u64 = 300;
pub const DEFAULT_ACCESS_TOKEN_TTL: u64 = 3600;
pub const DEFAULT_COOKIE_MAX_AGE_DAYS: i64 = 7;
pub const DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;
pub const DEFAULT_ACCOUNT_API_TIMEOUT: u64 = 10;
pub const DEFAULT_SWEEP_INTERVAL: u64 = 60;

pub const DEFAULT_CALLBACK_PATH: &str = "/callback";
/// Access tokens expiring within this window are refreshed before use.
pub const REFRESH_THRESHOLD_SECONDS: i64 = 300;
pub const SESSION_CHECK_INTERVAL_SECONDS: u64 = 30;

/// Raw entropy of an authorization code before hex encoding.
pub const AUTH_CODE_BYTES: usize = 32;
