//! Redirect URI checks

use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RedirectError {
    #[error("redirect_uri is not a valid URL: {0}")]
    Malformed(String),
    #[error("redirect_uri must be an absolute http(s) URL")]
    NotAbsolute,
}

/// Parse a redirect URI that must be an absolute `http`/`https` URL.
pub fn parse_absolute_url(value: &str) -> Result<Url, RedirectError> {
    let url = Url::parse(value).map_err(|e| RedirectError::Malformed(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(RedirectError::NotAbsolute);
    }
    Ok(url)
}

/// Scheme, host and port all equal.
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_url() {
        assert!(parse_absolute_url("https://app.example/cb").is_ok());
        assert!(parse_absolute_url("http://localhost:3000/callback?x=1").is_ok());
        assert!(matches!(parse_absolute_url("/callback"), Err(RedirectError::Malformed(_))));
        assert_eq!(parse_absolute_url("javascript:alert(1)"), Err(RedirectError::NotAbsolute));
        assert_eq!(parse_absolute_url("mailto:a@b.c"), Err(RedirectError::NotAbsolute));
    }

    #[test]
    fn test_same_origin() {
        let app = Url::parse("https://app.example").unwrap();
        assert!(is_same_origin(&app, &Url::parse("https://app.example/cb?x=1").unwrap()));
        assert!(!is_same_origin(&app, &Url::parse("https://evil.example/steal").unwrap()));
        assert!(!is_same_origin(&app, &Url::parse("http://app.example/cb").unwrap()));
        assert!(!is_same_origin(&app, &Url::parse("https://app.example:8443/cb").unwrap()));
    }
}
