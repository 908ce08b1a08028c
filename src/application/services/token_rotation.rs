//! Refresh-token rotation.
//!
//! A refresh token is single-use: exchanging it revokes it and mints a new
//! pair in the same group. Access tokens issued earlier in the group are not
//! revoked and run out on their own (short TTL).

use std::sync::Arc;

use crate::application::services::token_issuer::{IssuedPair, MAX_ISSUE_ATTEMPTS, TokenIssuer};
use crate::domain::entities::{RequestMeta, TokenKind, User};
use crate::domain::errors::{AuthError, PolicyReason};
use crate::domain::repositories::{TokenRepository, UserRepository};
use crate::utils::TokenCodec;

pub struct TokenRotation<T: TokenRepository, U: UserRepository> {
    tokens: Arc<T>,
    users: Arc<U>,
    issuer: Arc<TokenIssuer<T>>,
}

impl<T: TokenRepository, U: UserRepository> TokenRotation<T, U> {
    pub fn new(tokens: Arc<T>, users: Arc<U>, issuer: Arc<TokenIssuer<T>>) -> Self {
        Self {
            tokens,
            users,
            issuer,
        }
    }

    /// Exchanges `presented` for a new pair in the same group.
    ///
    /// The new refresh token keeps the name of the one it replaces.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MalformedToken`] if `presented` cannot be parsed
    /// - [`AuthError::InvalidToken`] if it is unknown, expired, revoked, not a
    ///   refresh token, or was rotated concurrently by another request
    /// - [`AuthError::PolicyViolation`] if the owner is gone or unverified
    pub async fn rotate(
        &self,
        presented: &str,
        access_name: &str,
        meta: &RequestMeta,
    ) -> Result<(User, IssuedPair), AuthError> {
        let (token_id, secret) = TokenCodec::parse(presented)?;
        let codec = self.issuer.codec();

        let current = self
            .tokens
            .find_valid(TokenKind::Refresh, &codec.hash(secret))
            .await?
            .filter(|t| t.id == token_id && codec.verify(secret, &t.token_hash))
            .ok_or(AuthError::InvalidToken)?;

        let user = self
            .users
            .find_by_id(current.owner_id)
            .await?
            .ok_or(AuthError::PolicyViolation(PolicyReason::Deleted))?;

        if !user.is_email_verified() {
            return Err(AuthError::PolicyViolation(PolicyReason::Unverified));
        }

        let mut attempt = 1;

        loop {
            let prepared = self.issuer.prepare_pair(
                &user,
                current.group_id,
                access_name,
                &current.name,
                meta,
            )?;

            match self
                .tokens
                .rotate(current.id, prepared.refresh.clone(), prepared.access.clone())
                .await
            {
                Ok(Some((refresh, access))) => {
                    tracing::info!(
                        user_id = user.id,
                        group_id = current.group_id,
                        revoked_id = current.id,
                        refresh_id = refresh.id,
                        "Rotated refresh token"
                    );
                    return Ok((user, prepared.finish(refresh, access)));
                }
                Ok(None) => {
                    tracing::warn!(
                        token_id = current.id,
                        group_id = current.group_id,
                        "Refresh token already rotated"
                    );
                    return Err(AuthError::InvalidToken);
                }
                Err(AuthError::Conflict { .. }) if attempt < MAX_ISSUE_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
