// ============================================================================
// SSO Core - Authorization Code Entity
// File: crates/sso-core/src/domain/auth_code.rs
// Description: One-time code bound to a user, a callback URL and an app
// ============================================================================

use serde::{Deserialize, Serialize};

/// Stored form of an issued authorization code.
///
/// A code is usable exactly once and never after `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCode {
    pub code: String,
    pub user_id: String,
    pub redirect_uri: String,
    pub app_id: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

impl AuthCode {
    pub fn new(
        code: String,
        user_id: String,
        redirect_uri: String,
        app_id: String,
        expires_at: i64,
    ) -> Self {
        Self {
            code,
            user_id,
            redirect_uri,
            app_id,
            expires_at,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }
}
