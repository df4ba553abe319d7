//! Browser-held session

use serde::{Deserialize, Serialize};

use sso_core::domain::TokenPair;
use sso_shared::utils::expiry_after;

/// Owned by the client that created it; `expires_at` is epoch millis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl ClientSession {
    pub fn from_tokens(tokens: TokenPair, now_ms: i64) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: expiry_after(now_ms, tokens.expires_in),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    pub fn expires_within(&self, seconds: i64, now_ms: i64) -> bool {
        self.expires_at.saturating_sub(now_ms) <= seconds.saturating_mul(1000)
    }
}
