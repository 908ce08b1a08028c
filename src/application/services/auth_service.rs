//! Authentication service: credentials, bearer tokens and session management.

use serde_json::json;
use std::sync::Arc;

use crate::application::services::token_issuer::{IssuedPair, TokenIssuer};
use crate::application::services::token_rotation::TokenRotation;
use crate::domain::entities::{AuthToken, NewUser, RequestMeta, TokenKind, User};
use crate::domain::errors::AuthError;
use crate::domain::query::{OrganizedQuery, Page, PageRequest};
use crate::domain::repositories::{TokenRepository, UserRepository};
use crate::utils::TokenCodec;
use crate::utils::password::{check_password_blocking, hash_password_blocking};

/// Names stamped on issued tokens and the registration switch.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub access_token_name: String,
    pub refresh_token_name: String,
    pub registration_enabled: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_token_name: "access_token".to_string(),
            refresh_token_name: "refresh_token".to_string(),
            registration_enabled: true,
        }
    }
}

/// The principal and token behind an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub token: AuthToken,
}

/// Input for [`AuthService::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Service for logging in, refreshing and revoking sessions.
///
/// Tokens are opaque `{id}.{secret}` strings; only an HMAC-SHA256 of the
/// secret, keyed by the server signing secret, is ever stored.
pub struct AuthService<T: TokenRepository, U: UserRepository> {
    tokens: Arc<T>,
    users: Arc<U>,
    issuer: Arc<TokenIssuer<T>>,
    rotation: TokenRotation<T, U>,
    settings: AuthSettings,
}

impl<T: TokenRepository, U: UserRepository> AuthService<T, U> {
    pub fn new(
        tokens: Arc<T>,
        users: Arc<U>,
        issuer: Arc<TokenIssuer<T>>,
        settings: AuthSettings,
    ) -> Self {
        let rotation = TokenRotation::new(tokens.clone(), users.clone(), issuer.clone());
        Self {
            tokens,
            users,
            issuer,
            rotation,
            settings,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Creates an account and logs it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RegistrationDisabled`] when sign-up is switched off.
    /// Returns [`AuthError::Conflict`] if the email is already registered.
    pub async fn register(
        &self,
        registration: Registration,
        meta: &RequestMeta,
    ) -> Result<(User, IssuedPair), AuthError> {
        if !self.settings.registration_enabled {
            return Err(AuthError::RegistrationDisabled);
        }

        let password_hash = hash_password_blocking(registration.password).await?;

        let user = self
            .users
            .create(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
                is_admin: false,
                email_verified_at: None,
            })
            .await
            .map_err(|e| match e {
                AuthError::Conflict { .. } => AuthError::conflict(
                    "The email has already been taken.",
                    json!({ "errors": { "email": ["The email has already been taken."] } }),
                ),
                other => other,
            })?;

        tracing::info!(user_id = user.id, "Registered user");

        let pair = self.issue_for(&user, meta).await?;
        Ok((user, pair))
    }

    /// Exchanges email and password for a new session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email and for a
    /// wrong password alike; both paths run one password verification.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        meta: &RequestMeta,
    ) -> Result<(User, IssuedPair), AuthError> {
        let user = self.users.find_by_email(email).await?;

        let matches = check_password_blocking(
            password.to_string(),
            user.as_ref().map(|u| u.password_hash.clone()),
        )
        .await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                tracing::info!(ip = ?meta.ip_address, "Failed login attempt");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let pair = self.issue_for(&user, meta).await?;
        Ok((user, pair))
    }

    /// Issues a pair in a new group using the configured token names.
    pub async fn issue_for(&self, user: &User, meta: &RequestMeta) -> Result<IssuedPair, AuthError> {
        self.issuer
            .issue_pair(
                user,
                &self.settings.access_token_name,
                &self.settings.refresh_token_name,
                meta,
            )
            .await
    }

    /// Rotates a refresh token. See [`TokenRotation::rotate`].
    pub async fn refresh(
        &self,
        refresh_token: &str,
        meta: &RequestMeta,
    ) -> Result<(User, IssuedPair), AuthError> {
        self.rotation
            .rotate(refresh_token, &self.settings.access_token_name, meta)
            .await
    }

    /// Resolves a bearer token of the expected `kind` to its principal.
    ///
    /// On success, `updated_at` of the token is bumped; a failure to do so is
    /// logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] if the token cannot be parsed.
    /// Returns [`AuthError::InvalidToken`] if it is unknown, revoked, expired,
    /// of the other kind, or its owner no longer exists.
    pub async fn authenticate(
        &self,
        plaintext: &str,
        kind: TokenKind,
    ) -> Result<AuthContext, AuthError> {
        let (token_id, secret) = TokenCodec::parse(plaintext)?;
        let codec = self.issuer.codec();

        let token = self
            .tokens
            .find_valid(kind, &codec.hash(secret))
            .await?
            .filter(|t| t.id == token_id && codec.verify(secret, &t.token_hash))
            .ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(token.owner_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if let Err(e) = self.tokens.touch(token.id).await {
            tracing::warn!(token_id = token.id, error = %e, "Failed to touch token");
        }

        Ok(AuthContext { user, token })
    }

    /// Revokes every token in the session of the presented token.
    pub async fn logout(&self, context: &AuthContext) -> Result<u64, AuthError> {
        let revoked = self.tokens.revoke_group(context.token.group_id).await?;

        tracing::info!(
            user_id = context.user.id,
            group_id = context.token.group_id,
            revoked,
            "Logged out"
        );

        Ok(revoked)
    }

    pub async fn list_tokens(
        &self,
        owner_id: i64,
        query: &OrganizedQuery,
        page: PageRequest,
    ) -> Result<Page<AuthToken>, AuthError> {
        self.tokens.list_for_owner(owner_id, query, page).await
    }

    /// Deletes the session that token `token_id` belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] if the token does not exist or belongs
    /// to someone else.
    pub async fn delete_token_group(&self, owner_id: i64, token_id: i64) -> Result<u64, AuthError> {
        let token = self
            .tokens
            .find_by_id(token_id)
            .await?
            .filter(|t| t.owner_id == owner_id)
            .ok_or_else(|| AuthError::not_found("Token not found", json!({ "id": token_id })))?;

        self.tokens.delete_group(owner_id, token.group_id).await
    }

    /// Deletes every token of `owner_id`, the current one included.
    pub async fn truncate_tokens(&self, owner_id: i64) -> Result<u64, AuthError> {
        let deleted = self.tokens.delete_all_for_owner(owner_id).await?;
        tracing::info!(user_id = owner_id, deleted, "Truncated tokens");
        Ok(deleted)
    }
}
