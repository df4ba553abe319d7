//! Request payloads

use serde::Deserialize;
use validator::Validate;

use sso_core::domain::LogoutType;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "identifier is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Optional authorize parameters carried on the login query string.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeQuery {
    pub redirect_uri: Option<String>,
    pub app_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CodeRequest {
    #[validate(url(message = "redirect_uri must be an absolute URL"))]
    pub redirect_uri: String,
    #[validate(length(min = 1, message = "app_id is required"))]
    pub app_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    #[validate(url(message = "redirect_uri must be an absolute URL"))]
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogoutBody {
    #[serde(rename = "type")]
    pub logout_type: LogoutType,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutQuery {
    pub app_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_request_rejects_relative_redirect() {
        let req = CodeRequest {
            redirect_uri: "/callback".into(),
            app_id: "energy".into(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("redirect_uri"));
    }

    #[test]
    fn test_logout_body_uses_type_field() {
        let body: LogoutBody =
            serde_json::from_str(r#"{"type":"global","refresh_token":"rt"}"#).unwrap();
        assert_eq!(body.logout_type, LogoutType::Global);
        assert_eq!(body.refresh_token.as_deref(), Some("rt"));
    }
}
