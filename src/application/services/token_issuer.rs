//! Minting of linked refresh/access token pairs.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

use crate::domain::entities::{AuthToken, NewAuthToken, RequestMeta, TokenKind, User};
use crate::domain::errors::AuthError;
use crate::domain::repositories::TokenRepository;
use crate::utils::TokenCodec;

/// Inserts are retried this many times when a generated hash collides.
pub(crate) const MAX_ISSUE_ATTEMPTS: u32 = 3;

/// How long freshly issued tokens stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    /// `None` issues refresh tokens that never expire.
    pub refresh: Option<Duration>,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Some(Duration::days(30)),
        }
    }
}

/// A freshly issued pair. The plaintext tokens are only available here.
pub struct IssuedPair {
    pub refresh_token: String,
    pub access_token: String,
    pub refresh: AuthToken,
    pub access: AuthToken,
}

impl fmt::Debug for IssuedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedPair")
            .field("refresh_token", &"***")
            .field("access_token", &"***")
            .field("refresh", &self.refresh)
            .field("access", &self.access)
            .finish()
    }
}

/// Rows ready for insertion, plus the secrets needed to encode them once ids exist.
pub(crate) struct PreparedPair {
    pub refresh: NewAuthToken,
    pub access: NewAuthToken,
    refresh_secret: String,
    access_secret: String,
}

impl PreparedPair {
    pub(crate) fn finish(self, refresh: AuthToken, access: AuthToken) -> IssuedPair {
        IssuedPair {
            refresh_token: TokenCodec::encode(refresh.id, &self.refresh_secret),
            access_token: TokenCodec::encode(access.id, &self.access_secret),
            refresh,
            access,
        }
    }
}

/// Service that creates access/refresh pairs bound to a session group.
pub struct TokenIssuer<R: TokenRepository> {
    repository: Arc<R>,
    codec: TokenCodec,
    lifetimes: TokenLifetimes,
}

impl<R: TokenRepository> TokenIssuer<R> {
    pub fn new(repository: Arc<R>, codec: TokenCodec, lifetimes: TokenLifetimes) -> Self {
        Self {
            repository,
            codec,
            lifetimes,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issues a pair in a brand-new group (login, registration, credential change).
    ///
    /// Both rows are inserted in one transaction. A hash collision regenerates
    /// both secrets and retries.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPrincipal`] if `principal` has not been persisted.
    /// Returns [`AuthError::Storage`] on database errors.
    pub async fn issue_pair(
        &self,
        principal: &User,
        access_name: &str,
        refresh_name: &str,
        meta: &RequestMeta,
    ) -> Result<IssuedPair, AuthError> {
        if !principal.is_persisted() {
            return Err(AuthError::InvalidPrincipal);
        }

        let group_id = self.repository.next_group_id().await?;
        let mut attempt = 1;

        loop {
            let prepared =
                self.prepare_pair(principal, group_id, access_name, refresh_name, meta)?;

            match self
                .repository
                .create_pair(prepared.refresh.clone(), prepared.access.clone())
                .await
            {
                Ok((refresh, access)) => {
                    tracing::info!(
                        user_id = principal.id,
                        group_id,
                        refresh_id = refresh.id,
                        access_id = access.id,
                        "Issued token pair"
                    );
                    return Ok(prepared.finish(refresh, access));
                }
                Err(AuthError::Conflict { .. }) if attempt < MAX_ISSUE_ATTEMPTS => {
                    tracing::warn!(attempt, group_id, "Token hash collision, regenerating");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Generates secrets and builds both rows for `group_id` without touching storage.
    pub(crate) fn prepare_pair(
        &self,
        principal: &User,
        group_id: i64,
        access_name: &str,
        refresh_name: &str,
        meta: &RequestMeta,
    ) -> Result<PreparedPair, AuthError> {
        let now = Utc::now();
        let refresh_secret = self.codec.issue()?;
        let access_secret = self.codec.issue()?;

        let row = |kind: TokenKind,
                   name: &str,
                   hash: String,
                   abilities: &str,
                   expires_at: Option<DateTime<Utc>>| {
            NewAuthToken {
                kind,
                owner_id: principal.id,
                owner_type: User::OWNER_TYPE.to_string(),
                group_id,
                name: name.to_string(),
                token_hash: hash,
                abilities: Some(vec![abilities.to_string()]),
                meta: meta.clone(),
                expires_at,
            }
        };

        Ok(PreparedPair {
            refresh: row(
                TokenKind::Refresh,
                refresh_name,
                refresh_secret.hash,
                "refresh",
                self.lifetimes.refresh.map(|ttl| now + ttl),
            ),
            access: row(
                TokenKind::Access,
                access_name,
                access_secret.hash,
                "*",
                Some(now + self.lifetimes.access),
            ),
            refresh_secret: refresh_secret.secret,
            access_secret: access_secret.secret,
        })
    }
}
