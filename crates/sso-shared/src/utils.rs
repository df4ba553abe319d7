//! Utility functions

use chrono::Utc;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `now_ms` plus a lifetime in seconds, saturating instead of overflowing
/// when a collaborator reports an absurd lifetime.
pub fn expiry_after(now_ms: i64, lifetime_secs: u64) -> i64 {
    let lifetime_ms = i64::try_from(lifetime_secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);
    now_ms.saturating_add(lifetime_ms)
}

/// Mask a login identifier for log output. E-mail addresses keep their
/// domain, anything else keeps only its first characters.
pub fn mask_identifier(identifier: &str) -> String {
    if let Some(at_pos) = identifier.find('@') {
        let (local, domain) = identifier.split_at(at_pos);
        let keep = if local.chars().count() <= 2 { 1 } else { 2 };
        let head: String = local.chars().take(keep).collect();
        format!("{}***{}", head, domain)
    } else if identifier.is_empty() {
        "***".to_string()
    } else {
        let head: String = identifier.chars().take(2).collect();
        format!("{}***", head)
    }
}
