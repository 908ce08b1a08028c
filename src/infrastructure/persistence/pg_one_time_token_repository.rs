//! PostgreSQL implementation of one-time token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewOneTimeToken, OneTimePurpose, OneTimeToken};
use crate::domain::errors::AuthError;
use crate::domain::repositories::OneTimeTokenRepository;

const COLUMNS: &str = "id, user_id, purpose, token_hash, expires_at, used_at, created_at";

#[derive(sqlx::FromRow)]
struct OneTimeTokenRow {
    id: i64,
    user_id: i64,
    purpose: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OneTimeTokenRow> for OneTimeToken {
    type Error = AuthError;

    fn try_from(row: OneTimeTokenRow) -> Result<Self, Self::Error> {
        Ok(OneTimeToken {
            id: row.id,
            user_id: row.user_id,
            purpose: row.purpose.parse().map_err(AuthError::Internal)?,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            used_at: row.used_at,
            created_at: row.created_at,
        })
    }
}

pub struct PgOneTimeTokenRepository {
    pool: Arc<PgPool>,
}

impl PgOneTimeTokenRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OneTimeTokenRepository for PgOneTimeTokenRepository {
    async fn replace(&self, token: NewOneTimeToken) -> Result<OneTimeToken, AuthError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM one_time_tokens WHERE user_id = $1 AND purpose = $2 AND used_at IS NULL",
        )
        .bind(token.user_id)
        .bind(token.purpose.as_str())
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "INSERT INTO one_time_tokens (user_id, purpose, token_hash, expires_at) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, OneTimeTokenRow>(&sql)
            .bind(token.user_id)
            .bind(token.purpose.as_str())
            .bind(&token.token_hash)
            .bind(token.expires_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AuthError::from_insert)?;

        tx.commit().await?;

        row.try_into()
    }

    async fn consume(
        &self,
        purpose: OneTimePurpose,
        token_hash: &str,
    ) -> Result<Option<OneTimeToken>, AuthError> {
        let sql = format!(
            "UPDATE one_time_tokens SET used_at = NOW() \
             WHERE token_hash = $1 AND purpose = $2 \
               AND used_at IS NULL AND expires_at > NOW() \
             RETURNING {COLUMNS}"
        );

        let row = sqlx::query_as::<_, OneTimeTokenRow>(&sql)
            .bind(token_hash)
            .bind(purpose.as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(OneTimeToken::try_from).transpose()
    }
}
