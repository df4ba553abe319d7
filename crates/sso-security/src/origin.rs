//! Relying-party origin policy for CORS

use url::Url;

/// Origins allowed to call the auth endpoints with credentials.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
    allow_localhost: bool,
}

impl OriginPolicy {
    pub fn new(allowed: Vec<String>, allow_localhost: bool) -> Self {
        let allowed = allowed
            .into_iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        Self { allowed, allow_localhost }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        if self.allowed.iter().any(|o| o == origin) {
            return true;
        }
        self.allow_localhost && is_localhost_origin(origin)
    }
}

/// `http://localhost` on any port.
fn is_localhost_origin(origin: &str) -> bool {
    match Url::parse(origin) {
        Ok(url) => url.scheme() == "http" && url.host_str() == Some("localhost"),
        Err(_) => false,
    }
}
