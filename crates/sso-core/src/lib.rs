//! # SSO Core
//!
//! Domain types, ports and services for the single sign-on protocol:
//! one-time authorization codes, global and per-app sessions, and the
//! orchestration behind the auth server endpoints.

pub mod domain;
pub mod error;
pub mod events;
pub mod keys;
pub mod repositories;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
pub use events::{EventBus, RevocationScope, SessionEventPublisher, SessionRevoked};
pub use repositories::{AccountApi, KeyedExpiringStore};
pub use services::{AuthCodeRegistry, AuthService, SessionRegistry};
