//! # SSO Client
//!
//! Relying-party side of the single sign-on flow: login redirect,
//! callback handling, token caching with refresh, and logout.

pub mod client;
pub mod config;
pub mod error;
pub mod navigator;
pub mod session;
pub mod state;
pub mod storage;
pub mod watcher;

pub use client::SsoClient;
pub use config::{SsoConfig, SsoConfigBuilder, TokenStorage};
pub use error::ClientError;
pub use navigator::{ChannelNavigator, Navigator};
pub use session::ClientSession;
pub use state::{AuthEvent, AuthState};
pub use storage::SessionStorage;
pub use watcher::SessionWatcher;
