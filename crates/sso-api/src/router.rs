//! Router assembly

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use sso_security::OriginPolicy;
use sso_shared::constants::APP_ID_HEADER;

use crate::handlers::{auth, health};
use crate::state::AppState;

/// Credentialed CORS for registered relying parties only. Other origins
/// get no CORS headers at all.
pub fn cors_layer(policy: OriginPolicy) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts| {
                origin
                    .to_str()
                    .map(|o| policy.is_allowed(o))
                    .unwrap_or(false)
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(APP_ID_HEADER),
        ])
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.origins.clone());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/code", post(auth::issue_code))
        .route("/api/auth/token", post(auth::token))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
