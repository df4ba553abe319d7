//! # SSO Core - Domain Module
//!
//! Domain entities for the single sign-on protocol.

pub mod auth_code;
pub mod session;
pub mod token;

// Re-export all entities and enums
pub use auth_code::AuthCode;
pub use session::{LogoutType, SessionRecord};
pub use token::TokenPair;
