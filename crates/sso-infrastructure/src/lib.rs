//! # SSO Infrastructure
//!
//! Store and Account API implementations (adapters).

pub mod account_api;
pub mod store;

pub use account_api::HttpAccountApi;
pub use store::{MemoryStore, RedisStore, StoreHandle};
