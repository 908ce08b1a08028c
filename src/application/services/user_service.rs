//! Administrative user management.

use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{User, UserPatch};
use crate::domain::errors::AuthError;
use crate::domain::query::{OrganizedQuery, Page, PageRequest};
use crate::domain::repositories::UserRepository;

/// Changes admins may apply to another account.
#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub is_admin: Option<bool>,
    pub email_verified: Option<bool>,
}

pub struct UserService<U: UserRepository> {
    users: Arc<U>,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    pub async fn list(
        &self,
        query: &OrganizedQuery,
        page: PageRequest,
    ) -> Result<Page<User>, AuthError> {
        self.users.list(query, page).await
    }

    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] if the user does not exist.
    pub async fn get(&self, id: i64) -> Result<User, AuthError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::not_found("User not found", json!({ "id": id })))
    }

    /// Applies an admin update to `target_id`.
    ///
    /// A role change deletes all tokens of the target in the same transaction,
    /// so it signs in again under its new privileges. Admins cannot demote
    /// themselves.
    pub async fn update(
        &self,
        actor: &User,
        target_id: i64,
        update: AdminUserUpdate,
    ) -> Result<User, AuthError> {
        if actor.id == target_id && update.is_admin == Some(false) {
            return Err(AuthError::validation(
                "You cannot remove your own admin role.",
                json!({ "errors": { "is_admin": ["You cannot remove your own admin role."] } }),
            ));
        }

        let target = self.get(target_id).await?;
        let role_changed = update.is_admin.is_some_and(|v| v != target.is_admin);

        let patch = UserPatch {
            is_admin: update.is_admin,
            email_verified_at: update.email_verified.map(|verified| {
                if verified {
                    target.email_verified_at.or_else(|| Some(chrono::Utc::now()))
                } else {
                    None
                }
            }),
            ..UserPatch::default()
        };

        if !role_changed {
            return self.users.update(target_id, patch).await;
        }

        let (user, deleted) = self
            .users
            .update_and_revoke_sessions(target_id, patch)
            .await?;
        tracing::info!(
            actor_id = actor.id,
            user_id = target_id,
            is_admin = user.is_admin,
            deleted,
            "Changed admin role"
        );

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::token_issuer::tests::user;
    use crate::domain::repositories::MockUserRepository;

    fn admin(id: i64) -> User {
        let mut u = user(id, true);
        u.is_admin = true;
        u
    }

    fn promote() -> AdminUserUpdate {
        AdminUserUpdate {
            is_admin: Some(true),
            ..AdminUserUpdate::default()
        }
    }

    #[tokio::test]
    async fn test_promote_deletes_sessions() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id, true))));
        users.expect_update().never();
        users
            .expect_update_and_revoke_sessions()
            .withf(|id, patch| *id == 7 && patch.is_admin == Some(true))
            .times(1)
            .returning(|id, _| Ok((admin(id), 2)));

        let updated = UserService::new(Arc::new(users))
            .update(&admin(1), 7, promote())
            .await
            .unwrap();

        assert!(updated.is_admin);
    }

    #[tokio::test]
    async fn test_promote_fails_when_sessions_cannot_be_deleted() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id, true))));
        users.expect_update().never();
        users
            .expect_update_and_revoke_sessions()
            .times(1)
            .returning(|_, _| Err(AuthError::Storage(sqlx::Error::PoolTimedOut)));

        let result = UserService::new(Arc::new(users))
            .update(&admin(1), 7, promote())
            .await;

        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    #[tokio::test]
    async fn test_verify_keeps_sessions() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id, false))));
        users
            .expect_update()
            .withf(|_, patch| matches!(patch.email_verified_at, Some(Some(_))))
            .returning(|id, _| Ok(user(id, true)));
        users.expect_update_and_revoke_sessions().never();

        let updated = UserService::new(Arc::new(users))
            .update(
                &admin(1),
                7,
                AdminUserUpdate {
                    email_verified: Some(true),
                    ..AdminUserUpdate::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.is_email_verified());
    }

    #[tokio::test]
    async fn test_self_demotion_rejected() {
        let result = UserService::new(Arc::new(MockUserRepository::new()))
            .update(
                &admin(1),
                1,
                AdminUserUpdate {
                    is_admin: Some(false),
                    ..AdminUserUpdate::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AuthError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let result = UserService::new(Arc::new(users)).get(42).await;

        assert!(matches!(result, Err(AuthError::NotFound { .. })));
    }
}
