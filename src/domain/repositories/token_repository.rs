//! Repository trait for access/refresh token rows.

use crate::domain::entities::{AuthToken, NewAuthToken, TokenKind};
use crate::domain::errors::AuthError;
use crate::domain::query::{OrganizedQuery, Page, PageRequest};
use async_trait::async_trait;

/// Repository interface for token persistence.
///
/// Rows are looked up by the HMAC of their secret; plaintext secrets never
/// reach this layer.
///
/// # Atomicity
///
/// [`create_pair`](TokenRepository::create_pair),
/// [`rotate`](TokenRepository::rotate) and
/// [`revoke_group`](TokenRepository::revoke_group) each run in a single
/// transaction: either every row changes or none does.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgTokenRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_token.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Allocates a fresh session group id.
    async fn next_group_id(&self) -> Result<i64, AuthError>;

    /// Inserts one token row.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the hash already exists for that kind.
    async fn create(&self, token: NewAuthToken) -> Result<AuthToken, AuthError>;

    /// Inserts a refresh and an access row in one transaction.
    ///
    /// Returns `(refresh, access)`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] on a hash collision; nothing is persisted then.
    async fn create_pair(
        &self,
        refresh: NewAuthToken,
        access: NewAuthToken,
    ) -> Result<(AuthToken, AuthToken), AuthError>;

    /// Finds a token of `kind` with `token_hash` that is neither revoked nor expired.
    async fn find_valid(
        &self,
        kind: TokenKind,
        token_hash: &str,
    ) -> Result<Option<AuthToken>, AuthError>;

    /// Finds a token by id regardless of its state.
    async fn find_by_id(&self, id: i64) -> Result<Option<AuthToken>, AuthError>;

    /// Sets `updated_at` after a successful authentication.
    async fn touch(&self, id: i64) -> Result<(), AuthError>;

    /// Revokes one token. Returns false if it was already revoked or missing.
    async fn revoke(&self, id: i64) -> Result<bool, AuthError>;

    /// Revokes every live token of a group. Returns the number of rows revoked.
    async fn revoke_group(&self, group_id: i64) -> Result<u64, AuthError>;

    /// Revokes the refresh token `refresh_id` and inserts a replacement pair.
    ///
    /// The revocation is conditional on the token still being live. When another
    /// request won the race (or the token was replayed) nothing is written and
    /// `Ok(None)` is returned.
    async fn rotate(
        &self,
        refresh_id: i64,
        refresh: NewAuthToken,
        access: NewAuthToken,
    ) -> Result<Option<(AuthToken, AuthToken)>, AuthError>;

    /// Hard-deletes every token of `group_id` owned by `owner_id`.
    async fn delete_group(&self, owner_id: i64, group_id: i64) -> Result<u64, AuthError>;

    /// Hard-deletes every token owned by `owner_id`.
    async fn delete_all_for_owner(&self, owner_id: i64) -> Result<u64, AuthError>;

    /// Lists tokens of `owner_id` with filter/search/sort applied.
    async fn list_for_owner(
        &self,
        owner_id: i64,
        query: &OrganizedQuery,
        page: PageRequest,
    ) -> Result<Page<AuthToken>, AuthError>;
}
