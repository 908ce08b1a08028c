//! Repository trait for email verification and password reset tokens.

use crate::domain::entities::{NewOneTimeToken, OneTimePurpose, OneTimeToken};
use crate::domain::errors::AuthError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OneTimeTokenRepository: Send + Sync {
    /// Stores a new token, discarding unused tokens of the same user and purpose.
    async fn replace(&self, token: NewOneTimeToken) -> Result<OneTimeToken, AuthError>;

    /// Marks an unused, unexpired token as used and returns it.
    ///
    /// Returns `Ok(None)` if the hash is unknown, expired, already used, or
    /// issued for another purpose.
    async fn consume(
        &self,
        purpose: OneTimePurpose,
        token_hash: &str,
    ) -> Result<Option<OneTimeToken>, AuthError>;
}
