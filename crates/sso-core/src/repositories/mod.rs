//! Repository traits (ports)

pub mod account_api;
pub mod store;

pub use account_api::AccountApi;
pub use store::KeyedExpiringStore;

#[cfg(test)]
pub use account_api::MockAccountApi;
