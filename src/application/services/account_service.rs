//! Account self-service: email verification, password reset and credential changes.
//!
//! Every change to a credential removes all tokens of the account. Where the
//! caller is still signed in, a fresh pair is handed back.

use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::application::services::auth_service::AuthService;
use crate::application::services::token_issuer::IssuedPair;
use crate::domain::entities::{NewOneTimeToken, OneTimePurpose, RequestMeta, User, UserPatch};
use crate::domain::errors::AuthError;
use crate::domain::notifications::{MailMessage, Mailer};
use crate::domain::repositories::{OneTimeTokenRepository, TokenRepository, UserRepository};
use crate::utils::TokenCodec;
use crate::utils::password::{check_password_blocking, hash_password_blocking};

/// Lifetimes of one-time links and the base URL they point to.
#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub app_url: String,
    pub email_verification_ttl: Duration,
    pub password_reset_ttl: Duration,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3000".to_string(),
            email_verification_ttl: Duration::hours(24),
            password_reset_ttl: Duration::minutes(60),
        }
    }
}

pub struct AccountService<T: TokenRepository, U: UserRepository, O: OneTimeTokenRepository> {
    tokens: Arc<T>,
    users: Arc<U>,
    one_time: Arc<O>,
    auth: Arc<AuthService<T, U>>,
    codec: TokenCodec,
    mailer: Arc<dyn Mailer>,
    settings: AccountSettings,
}

impl<T: TokenRepository, U: UserRepository, O: OneTimeTokenRepository> AccountService<T, U, O> {
    pub fn new(
        tokens: Arc<T>,
        users: Arc<U>,
        one_time: Arc<O>,
        auth: Arc<AuthService<T, U>>,
        codec: TokenCodec,
        mailer: Arc<dyn Mailer>,
        settings: AccountSettings,
    ) -> Self {
        Self {
            tokens,
            users,
            one_time,
            auth,
            codec,
            mailer,
            settings,
        }
    }

    /// Mails a verification link unless the address is already verified.
    pub async fn send_verification(&self, user: &User) -> Result<(), AuthError> {
        if user.is_email_verified() {
            return Ok(());
        }

        let secret = self
            .issue_one_time(user.id, OneTimePurpose::EmailVerification)
            .await?;

        self.mailer
            .send(MailMessage {
                to: user.email.clone(),
                subject: "Verify your email address".to_string(),
                body: format!(
                    "Hello {},\n\nconfirm your email address by opening:\n{}/verify-email?token={}\n",
                    user.name,
                    self.settings.app_url.trim_end_matches('/'),
                    secret
                ),
            })
            .await
    }

    /// Marks the address behind `token` as verified.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token is unknown, used or expired.
    pub async fn verify_email(&self, token: &str) -> Result<User, AuthError> {
        let used = self
            .one_time
            .consume(OneTimePurpose::EmailVerification, &self.codec.hash(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .update(
                used.user_id,
                UserPatch {
                    email_verified_at: Some(Some(Utc::now())),
                    ..UserPatch::default()
                },
            )
            .await?;

        tracing::info!(user_id = user.id, "Email verified");
        Ok(user)
    }

    /// Mails a reset link if `email` belongs to an account.
    ///
    /// Succeeds identically whether or not the account exists.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let secret = self
            .issue_one_time(user.id, OneTimePurpose::PasswordReset)
            .await?;

        self.mailer
            .send(MailMessage {
                to: user.email.clone(),
                subject: "Reset your password".to_string(),
                body: format!(
                    "Hello {},\n\nchoose a new password here:\n{}/reset-password?token={}\n\nThe link expires in {} minutes.\n",
                    user.name,
                    self.settings.app_url.trim_end_matches('/'),
                    secret,
                    self.settings.password_reset_ttl.num_minutes()
                ),
            })
            .await
    }

    /// Sets a new password using a reset token and signs the account out everywhere.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token is unknown, used or expired.
    pub async fn reset_password(&self, token: &str, new_password: String) -> Result<(), AuthError> {
        let used = self
            .one_time
            .consume(OneTimePurpose::PasswordReset, &self.codec.hash(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let password_hash = hash_password_blocking(new_password).await?;
        let (_, deleted) = self
            .users
            .update_and_revoke_sessions(
                used.user_id,
                UserPatch {
                    password_hash: Some(password_hash),
                    ..UserPatch::default()
                },
            )
            .await?;

        tracing::info!(user_id = used.user_id, deleted, "Password reset");
        Ok(())
    }

    /// Changes the password of a signed-in user and starts a new session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if `current_password` is wrong.
    pub async fn change_password(
        &self,
        user: &User,
        current_password: String,
        new_password: String,
        meta: &RequestMeta,
    ) -> Result<IssuedPair, AuthError> {
        self.confirm_password(user, current_password, "current_password")
            .await?;

        let password_hash = hash_password_blocking(new_password).await?;
        let (user, deleted) = self
            .users
            .update_and_revoke_sessions(
                user.id,
                UserPatch {
                    password_hash: Some(password_hash),
                    ..UserPatch::default()
                },
            )
            .await?;

        tracing::info!(user_id = user.id, deleted, "Password changed");

        self.auth.issue_for(&user, meta).await
    }

    /// Changes the email address, which then needs verifying again.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if `password` is wrong.
    /// Returns [`AuthError::Conflict`] if the address belongs to another account.
    pub async fn change_email(
        &self,
        user: &User,
        new_email: String,
        password: String,
        meta: &RequestMeta,
    ) -> Result<(User, IssuedPair), AuthError> {
        self.confirm_password(user, password, "password").await?;

        let (user, deleted) = self
            .users
            .update_and_revoke_sessions(
                user.id,
                UserPatch {
                    email: Some(new_email),
                    email_verified_at: Some(None),
                    ..UserPatch::default()
                },
            )
            .await
            .map_err(|e| match e {
                AuthError::Conflict { .. } => AuthError::conflict(
                    "The email has already been taken.",
                    json!({ "errors": { "email": ["The email has already been taken."] } }),
                ),
                other => other,
            })?;

        tracing::info!(user_id = user.id, deleted, "Email changed");

        let pair = self.auth.issue_for(&user, meta).await?;

        if let Err(e) = self.send_verification(&user).await {
            tracing::warn!(user_id = user.id, error = %e, "Failed to send verification email");
        }

        Ok((user, pair))
    }

    /// Deletes the account and every token it owns.
    pub async fn delete_account(&self, user: &User, password: String) -> Result<(), AuthError> {
        self.confirm_password(user, password, "password").await?;

        self.tokens.delete_all_for_owner(user.id).await?;
        if !self.users.delete(user.id).await? {
            return Err(AuthError::not_found(
                "User not found",
                json!({ "id": user.id }),
            ));
        }

        tracing::info!(user_id = user.id, "Account deleted");
        Ok(())
    }

    async fn confirm_password(
        &self,
        user: &User,
        password: String,
        field: &str,
    ) -> Result<(), AuthError> {
        if check_password_blocking(password, Some(user.password_hash.clone())).await? {
            return Ok(());
        }

        Err(AuthError::validation(
            "The provided password is incorrect.",
            json!({ "errors": { field: ["The provided password is incorrect."] } }),
        ))
    }

    async fn issue_one_time(&self, user_id: i64, purpose: OneTimePurpose) -> Result<String, AuthError> {
        let ttl = match purpose {
            OneTimePurpose::EmailVerification => self.settings.email_verification_ttl,
            OneTimePurpose::PasswordReset => self.settings.password_reset_ttl,
        };
        let issued = self.codec.issue()?;

        self.one_time
            .replace(NewOneTimeToken {
                user_id,
                purpose,
                token_hash: issued.hash,
                expires_at: Utc::now() + ttl,
            })
            .await?;

        Ok(issued.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::auth_service::AuthSettings;
    use crate::application::services::token_issuer::tests::{stored, user};
    use crate::application::services::token_issuer::{TokenIssuer, TokenLifetimes};
    use crate::domain::entities::OneTimeToken;
    use crate::domain::notifications::MockMailer;
    use crate::domain::repositories::{
        MockOneTimeTokenRepository, MockTokenRepository, MockUserRepository,
    };
    use crate::utils::password::hash_password;

    const SECRET: &str = "test-signing-secret";

    struct Mocks {
        tokens: MockTokenRepository,
        users: MockUserRepository,
        one_time: MockOneTimeTokenRepository,
        mailer: MockMailer,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                tokens: MockTokenRepository::new(),
                users: MockUserRepository::new(),
                one_time: MockOneTimeTokenRepository::new(),
                mailer: MockMailer::new(),
            }
        }

        fn build(
            self,
        ) -> AccountService<MockTokenRepository, MockUserRepository, MockOneTimeTokenRepository>
        {
            let tokens = Arc::new(self.tokens);
            let users = Arc::new(self.users);
            let codec = TokenCodec::new(SECRET);
            let issuer = Arc::new(TokenIssuer::new(
                tokens.clone(),
                codec.clone(),
                TokenLifetimes::default(),
            ));
            let auth = Arc::new(AuthService::new(
                tokens.clone(),
                users.clone(),
                issuer,
                AuthSettings::default(),
            ));
            AccountService::new(
                tokens,
                users,
                Arc::new(self.one_time),
                auth,
                codec,
                Arc::new(self.mailer),
                AccountSettings::default(),
            )
        }
    }

    fn used(user_id: i64, purpose: OneTimePurpose) -> OneTimeToken {
        OneTimeToken {
            id: 1,
            user_id,
            purpose,
            token_hash: String::new(),
            expires_at: Utc::now() + Duration::minutes(5),
            used_at: Some(Utc::now()),
            created_at: Utc::now(),
        }
    }

    fn with_password(id: i64, password: &str) -> User {
        let mut u = user(id, true);
        u.password_hash = hash_password(password).unwrap();
        u
    }

    fn stored_one_time(t: NewOneTimeToken) -> OneTimeToken {
        OneTimeToken {
            id: 1,
            user_id: t.user_id,
            purpose: t.purpose,
            token_hash: t.token_hash,
            expires_at: t.expires_at,
            used_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_is_silent() {
        let mut m = Mocks::new();
        m.users.expect_find_by_email().returning(|_| Ok(None));
        m.one_time.expect_replace().never();
        m.mailer.expect_send().never();

        assert!(m.build().forgot_password("nobody@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_forgot_password_mails_hashed_token() {
        let mut m = Mocks::new();
        m.users
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(5, true))));
        m.one_time
            .expect_replace()
            .withf(|t| t.user_id == 5 && t.purpose == OneTimePurpose::PasswordReset)
            .times(1)
            .returning(|t| Ok(stored_one_time(t)));
        m.mailer
            .expect_send()
            .withf(|msg| msg.to == "ada@example.com" && msg.body.contains("/reset-password?token="))
            .times(1)
            .returning(|_| Ok(()));

        assert!(m.build().forgot_password("ada@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_invalid_token() {
        let mut m = Mocks::new();
        m.one_time.expect_consume().returning(|_, _| Ok(None));
        m.users.expect_update().never();

        let result = m.build().reset_password("bogus", "new-password".to_string()).await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_reset_password_signs_out_everywhere() {
        let mut m = Mocks::new();
        m.one_time
            .expect_consume()
            .withf(|p, _| *p == OneTimePurpose::PasswordReset)
            .returning(|p, _| Ok(Some(used(5, p))));
        m.users.expect_update().never();
        m.users
            .expect_update_and_revoke_sessions()
            .withf(|id, patch| *id == 5 && patch.password_hash.is_some())
            .times(1)
            .returning(|id, _| Ok((user(id, true), 4)));

        let result = m.build().reset_password("token", "new-password".to_string()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_reports_failed_sign_out() {
        let mut m = Mocks::new();
        m.one_time
            .expect_consume()
            .returning(|p, _| Ok(Some(used(5, p))));
        m.users.expect_update().never();
        m.users
            .expect_update_and_revoke_sessions()
            .times(1)
            .returning(|_, _| Err(AuthError::Storage(sqlx::Error::PoolTimedOut)));

        let result = m.build().reset_password("token", "new-password".to_string()).await;

        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    #[tokio::test]
    async fn test_verify_email() {
        let mut m = Mocks::new();
        m.one_time
            .expect_consume()
            .withf(|p, _| *p == OneTimePurpose::EmailVerification)
            .returning(|p, _| Ok(Some(used(5, p))));
        m.users
            .expect_update()
            .withf(|_, patch| matches!(patch.email_verified_at, Some(Some(_))))
            .returning(|id, _| Ok(user(id, true)));

        let verified = m.build().verify_email("token").await.unwrap();

        assert!(verified.is_email_verified());
    }

    #[tokio::test]
    async fn test_send_verification_skips_verified() {
        let mut m = Mocks::new();
        m.mailer.expect_send().never();

        assert!(m.build().send_verification(&user(5, true)).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let mut m = Mocks::new();
        m.users.expect_update().never();
        m.users.expect_update_and_revoke_sessions().never();

        let result = m
            .build()
            .change_password(
                &with_password(5, "old-password"),
                "wrong".to_string(),
                "new-password".to_string(),
                &RequestMeta::default(),
            )
            .await;

        match result {
            Err(AuthError::Validation { details, .. }) => {
                assert!(details["errors"]["current_password"].is_array());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_change_password_replaces_sessions() {
        let mut m = Mocks::new();
        let mut seq = mockall::Sequence::new();
        m.users
            .expect_update_and_revoke_sessions()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id, _| Ok((user(id, true), 3)));
        m.tokens
            .expect_next_group_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(8));
        m.tokens
            .expect_create_pair()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|r, a| Ok((stored(&r, 1), stored(&a, 2))));

        let pair = m
            .build()
            .change_password(
                &with_password(5, "old-password"),
                "old-password".to_string(),
                "new-password".to_string(),
                &RequestMeta::default(),
            )
            .await
            .unwrap();

        assert_eq!(pair.access.group_id, 8);
    }

    #[tokio::test]
    async fn test_change_password_failure_issues_nothing() {
        let mut m = Mocks::new();
        m.users.expect_update().never();
        m.users
            .expect_update_and_revoke_sessions()
            .times(1)
            .returning(|_, _| Err(AuthError::Storage(sqlx::Error::PoolTimedOut)));
        m.tokens.expect_next_group_id().never();
        m.tokens.expect_create_pair().never();

        let result = m
            .build()
            .change_password(
                &with_password(5, "old-password"),
                "old-password".to_string(),
                "new-password".to_string(),
                &RequestMeta::default(),
            )
            .await;

        assert!(matches!(result, Err(AuthError::Storage(_))));
    }

    #[tokio::test]
    async fn test_change_email_resets_verification() {
        let mut m = Mocks::new();
        m.users
            .expect_update_and_revoke_sessions()
            .withf(|_, patch| patch.email.is_some() && patch.email_verified_at == Some(None))
            .times(1)
            .returning(|id, patch| {
                let mut u = user(id, false);
                u.email = patch.email.unwrap_or_default();
                Ok((u, 2))
            });
        m.tokens.expect_next_group_id().returning(|| Ok(8));
        m.tokens
            .expect_create_pair()
            .returning(|r, a| Ok((stored(&r, 1), stored(&a, 2))));
        m.one_time
            .expect_replace()
            .withf(|t| t.purpose == OneTimePurpose::EmailVerification)
            .returning(|t| Ok(stored_one_time(t)));
        m.mailer
            .expect_send()
            .withf(|msg| msg.to == "new@example.com")
            .times(1)
            .returning(|_| Ok(()));

        let (updated, _) = m
            .build()
            .change_email(
                &with_password(5, "password123"),
                "new@example.com".to_string(),
                "password123".to_string(),
                &RequestMeta::default(),
            )
            .await
            .unwrap();

        assert!(!updated.is_email_verified());
    }

    #[tokio::test]
    async fn test_delete_account() {
        let mut m = Mocks::new();
        m.tokens
            .expect_delete_all_for_owner()
            .times(1)
            .returning(|_| Ok(2));
        m.users
            .expect_delete()
            .withf(|id| *id == 5)
            .times(1)
            .returning(|_| Ok(true));

        let result = m
            .build()
            .delete_account(&with_password(5, "password123"), "password123".to_string())
            .await;

        assert!(result.is_ok());
    }
}
