//! # SSO API
//!
//! HTTP handlers, DTOs, error mapping and the router for the auth server.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod router;
pub mod state;
pub mod throttle;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, CookieSettings};
pub use throttle::LoginLimiter;
