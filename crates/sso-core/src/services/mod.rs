//! Domain services

pub mod auth_code_registry;
pub mod auth_service;
pub mod session_registry;

pub use auth_code_registry::AuthCodeRegistry;
pub use auth_service::{AuthService, AuthorizeTarget, LoginOutcome, LogoutOutcome, LogoutRequest};
pub use session_registry::SessionRegistry;
