//! Account API trait (port)

use async_trait::async_trait;

use crate::domain::TokenPair;
use crate::error::DomainError;

/// External collaborator that owns credentials and mints tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Check credentials and return the user id.
    async fn authenticate(&self, identifier: &str, password: &str) -> Result<String, DomainError>;

    async fn issue_tokens(&self, user_id: &str) -> Result<TokenPair, DomainError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError>;

    async fn revoke(&self, refresh_token: &str) -> Result<(), DomainError>;
}
