//! Store key layout

use sso_shared::constants::{APP_SESSION_KEY_PREFIX, AUTH_CODE_KEY_PREFIX, SESSION_KEY_PREFIX};

pub fn auth_code_key(code: &str) -> String {
    format!("{AUTH_CODE_KEY_PREFIX}{code}")
}

pub fn session_key(user_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{user_id}")
}

pub fn app_session_key(app_id: &str, user_id: &str) -> String {
    format!("{APP_SESSION_KEY_PREFIX}{app_id}:{user_id}")
}

/// Extract the app id from `app_session:{app_id}:{user_id}` when the key
/// belongs to `user_id`.
pub fn app_id_for_user<'a>(key: &'a str, user_id: &str) -> Option<&'a str> {
    let rest = key.strip_prefix(APP_SESSION_KEY_PREFIX)?;
    let app_id = rest.strip_suffix(user_id)?.strip_suffix(':')?;
    if app_id.is_empty() || app_id.contains(':') {
        return None;
    }
    Some(app_id)
}
