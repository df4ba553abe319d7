//! Session entities

use serde::{Deserialize, Serialize};

/// Session stored under `session:{user_id}` (global) or
/// `app_session:{app_id}:{user_id}` (local).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

impl SessionRecord {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }
}

/// Scope of a logout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoutType {
    /// Revoke only the calling app's session.
    Local,
    /// Revoke every session of the user.
    Global,
}

impl LogoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoutType::Local => "local",
            LogoutType::Global => "global",
        }
    }
}
