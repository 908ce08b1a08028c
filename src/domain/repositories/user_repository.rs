//! Repository trait for users.

use crate::domain::entities::{NewUser, User, UserPatch};
use crate::domain::errors::AuthError;
use crate::domain::query::{OrganizedQuery, Page, PageRequest};
use async_trait::async_trait;

/// Repository interface for the principal store.
///
/// Emails are compared case-insensitively.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] if the user does not exist.
    /// Returns [`AuthError::Conflict`] if a new email is already taken.
    async fn update(&self, id: i64, patch: UserPatch) -> Result<User, AuthError>;

    /// Applies a partial update and deletes every token of the user in one
    /// transaction. Returns the updated user and the number of tokens deleted.
    ///
    /// Neither write persists unless both succeed.
    ///
    /// # Errors
    ///
    /// Same as [`UserRepository::update`].
    async fn update_and_revoke_sessions(
        &self,
        id: i64,
        patch: UserPatch,
    ) -> Result<(User, u64), AuthError>;

    /// Deletes the user. Tokens cascade. Returns false if nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool, AuthError>;

    async fn list(&self, query: &OrganizedQuery, page: PageRequest)
    -> Result<Page<User>, AuthError>;
}
