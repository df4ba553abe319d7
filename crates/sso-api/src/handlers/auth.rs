// ============================================================================
// SSO API - Auth Handlers
// File: crates/sso-api/src/handlers/auth.rs
// ============================================================================
//! Login, code, token, refresh and logout endpoints

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use axum_extra::extract::cookie::CookieJar;

use sso_core::domain::{LogoutType, TokenPair};
use sso_core::services::{AuthorizeTarget, LogoutRequest};
use sso_core::DomainError;
use sso_security::cookie::{clear_user_cookie, user_cookie};
use sso_shared::constants::{APP_ID_HEADER, USER_ID_COOKIE};

use crate::dto::{
    AuthorizeQuery, CodeRequest, LoginRequest, LogoutBody, LogoutQuery, RefreshRequest,
    TokenRequest,
};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::response::{CodeResponse, LoginResponse, MessageResponse};
use crate::state::AppState;

fn cookie_user(jar: &CookieJar) -> Option<&str> {
    jar.get(USER_ID_COOKIE).map(|c| c.value())
}

impl AuthorizeQuery {
    /// Both parameters or neither.
    fn target(&self) -> Result<Option<AuthorizeTarget>, ApiError> {
        match (self.redirect_uri.as_deref(), self.app_id.as_deref()) {
            (None, None) => Ok(None),
            (Some(redirect_uri), Some(app_id)) => Ok(Some(AuthorizeTarget {
                redirect_uri: redirect_uri.to_string(),
                app_id: app_id.to_string(),
            })),
            _ => Err(DomainError::ValidationError(
                "redirect_uri and app_id must be supplied together".into(),
            )
            .into()),
        }
    }
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    state.login_limiter.check(&payload.identifier)?;
    let target = query.target()?;

    let outcome = state
        .auth
        .login(&payload.identifier, &payload.password, target.as_ref())
        .await?;

    let jar = jar.add(user_cookie(
        &outcome.user_id,
        state.cookie.max_age_days,
        state.cookie.secure,
    ));
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user_id: outcome.user_id,
            redirect_url: outcome.redirect_url,
        }),
    ))
}

/// POST /api/auth/code
pub async fn issue_code(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<CodeRequest>,
) -> Result<Json<CodeResponse>, ApiError> {
    let target = AuthorizeTarget {
        redirect_uri: payload.redirect_uri,
        app_id: payload.app_id,
    };
    let code = state.auth.issue_code(cookie_user(&jar), &target).await?;
    Ok(Json(CodeResponse {
        code,
        redirect_uri: target.redirect_uri,
    }))
}

/// POST /api/auth/token
pub async fn token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state
        .auth
        .exchange(&payload.code, &payload.redirect_uri)
        .await?;
    Ok(Json(tokens))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(tokens))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Query(query): Query<LogoutQuery>,
    headers: HeaderMap,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LogoutBody>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let app_id = headers
        .get(APP_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(query.app_id);

    let outcome = state
        .auth
        .logout(
            cookie_user(&jar),
            LogoutRequest {
                logout_type: payload.logout_type,
                app_id,
                refresh_token: payload.refresh_token,
            },
        )
        .await?;

    let (jar, message) = match outcome.logout_type {
        LogoutType::Local => (
            jar,
            format!("Logged out from {}", outcome.revoked_apps.join(", ")),
        ),
        LogoutType::Global => (
            jar.add(clear_user_cookie(state.cookie.secure)),
            format!(
                "Logged out from all applications ({} app sessions revoked)",
                outcome.revoked_apps.len()
            ),
        ),
    };
    Ok((jar, Json(MessageResponse::ok(message))))
}
