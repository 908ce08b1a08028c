//! PostgreSQL implementation of token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{AuthToken, NewAuthToken, TokenKind, User};
use crate::domain::errors::AuthError;
use crate::domain::query::{OrganizedQuery, Page, PageRequest};
use crate::domain::repositories::TokenRepository;
use crate::infrastructure::persistence::query_builder::{
    push_conditions, push_limit_offset, push_order_by,
};

const COLUMNS: &str = "id, kind, owner_id, owner_type, group_id, name, token_hash, abilities, \
     ip_address, ip_host, user_agent, revoked_at, expires_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    kind: String,
    owner_id: i64,
    owner_type: String,
    group_id: i64,
    name: String,
    token_hash: String,
    abilities: Option<Vec<String>>,
    ip_address: Option<String>,
    ip_host: Option<String>,
    user_agent: Option<String>,
    revoked_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for AuthToken {
    type Error = AuthError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(AuthToken {
            id: row.id,
            kind: row.kind.parse().map_err(AuthError::Internal)?,
            owner_id: row.owner_id,
            owner_type: row.owner_type,
            group_id: row.group_id,
            name: row.name,
            token_hash: row.token_hash,
            abilities: row.abilities,
            ip_address: row.ip_address,
            ip_host: row.ip_host,
            user_agent: row.user_agent,
            revoked_at: row.revoked_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL repository for access and refresh tokens.
///
/// Stores HMAC-SHA256 hashes only. Multi-row writes run in a transaction.
pub struct PgTokenRepository {
    pool: Arc<PgPool>,
}

impl PgTokenRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

async fn insert<'e, E: PgExecutor<'e>>(
    executor: E,
    token: &NewAuthToken,
) -> Result<AuthToken, AuthError> {
    let sql = format!(
        "INSERT INTO auth_tokens \
         (kind, owner_id, owner_type, group_id, name, token_hash, abilities, ip_address, ip_host, user_agent, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {COLUMNS}"
    );

    let row = sqlx::query_as::<_, TokenRow>(&sql)
        .bind(token.kind.as_str())
        .bind(token.owner_id)
        .bind(&token.owner_type)
        .bind(token.group_id)
        .bind(&token.name)
        .bind(&token.token_hash)
        .bind(&token.abilities)
        .bind(&token.meta.ip_address)
        .bind(&token.meta.ip_host)
        .bind(&token.meta.user_agent)
        .bind(token.expires_at)
        .fetch_one(executor)
        .await
        .map_err(AuthError::from_insert)?;

    row.try_into()
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn next_group_id(&self) -> Result<i64, AuthError> {
        let id = sqlx::query_scalar::<_, i64>("SELECT nextval('auth_token_groups_seq')")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(id)
    }

    async fn create(&self, token: NewAuthToken) -> Result<AuthToken, AuthError> {
        insert(self.pool.as_ref(), &token).await
    }

    async fn create_pair(
        &self,
        refresh: NewAuthToken,
        access: NewAuthToken,
    ) -> Result<(AuthToken, AuthToken), AuthError> {
        let mut tx = self.pool.begin().await?;

        let refresh = insert(&mut *tx, &refresh).await?;
        let access = insert(&mut *tx, &access).await?;

        tx.commit().await?;

        Ok((refresh, access))
    }

    async fn find_valid(
        &self,
        kind: TokenKind,
        token_hash: &str,
    ) -> Result<Option<AuthToken>, AuthError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM auth_tokens \
             WHERE kind = $1 AND token_hash = $2 \
               AND revoked_at IS NULL \
               AND (expires_at IS NULL OR expires_at > NOW())"
        );

        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(kind.as_str())
            .bind(token_hash)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(AuthToken::try_from).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AuthToken>, AuthError> {
        let sql = format!("SELECT {COLUMNS} FROM auth_tokens WHERE id = $1");

        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(AuthToken::try_from).transpose()
    }

    async fn touch(&self, id: i64) -> Result<(), AuthError> {
        sqlx::query("UPDATE auth_tokens SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn revoke(&self, id: i64) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE auth_tokens
            SET revoked_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_group(&self, group_id: i64) -> Result<u64, AuthError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE auth_tokens
            SET revoked_at = NOW(), updated_at = NOW()
            WHERE group_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(group_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn rotate(
        &self,
        refresh_id: i64,
        refresh: NewAuthToken,
        access: NewAuthToken,
    ) -> Result<Option<(AuthToken, AuthToken)>, AuthError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent rotations queue on the row lock; the loser re-checks
        // `revoked_at IS NULL` after the winner commits and matches nothing.
        let revoked = sqlx::query(
            r#"
            UPDATE auth_tokens
            SET revoked_at = NOW(), updated_at = NOW()
            WHERE id = $1
              AND kind = 'refresh'
              AND revoked_at IS NULL
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .bind(refresh_id)
        .execute(&mut *tx)
        .await?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let refresh = insert(&mut *tx, &refresh).await?;
        let access = insert(&mut *tx, &access).await?;

        tx.commit().await?;

        Ok(Some((refresh, access)))
    }

    async fn delete_group(&self, owner_id: i64, group_id: i64) -> Result<u64, AuthError> {
        let result = sqlx::query(
            "DELETE FROM auth_tokens WHERE owner_type = $1 AND owner_id = $2 AND group_id = $3",
        )
        .bind(User::OWNER_TYPE)
        .bind(owner_id)
        .bind(group_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all_for_owner(&self, owner_id: i64) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE owner_type = $1 AND owner_id = $2")
            .bind(User::OWNER_TYPE)
            .bind(owner_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_for_owner(
        &self,
        owner_id: i64,
        query: &OrganizedQuery,
        page: PageRequest,
    ) -> Result<Page<AuthToken>, AuthError> {
        let scoped = |select: &str| {
            let mut builder = QueryBuilder::<Postgres>::new(select);
            builder.push(" FROM auth_tokens WHERE owner_type = ");
            builder.push_bind(User::OWNER_TYPE);
            builder.push(" AND owner_id = ");
            builder.push_bind(owner_id);
            push_conditions(&mut builder, query);
            builder
        };

        let mut count = scoped("SELECT COUNT(*)");
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut select = scoped(&format!("SELECT {COLUMNS}"));
        push_order_by(&mut select, query);
        push_limit_offset(&mut select, page.limit(), page.offset());

        let rows = select
            .build_query_as::<TokenRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(AuthToken::try_from)
                .collect::<Result<_, _>>()?,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }
}
