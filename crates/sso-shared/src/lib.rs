//! # SSO Shared
//!
//! Configuration, constants, telemetry and small helpers shared by the SSO
//! server crates and the relying-party client.

pub mod constants;
pub mod types;
pub mod utils;
pub mod telemetry;
pub mod config;
pub mod error;

pub use types::*;
pub use error::AppError;
