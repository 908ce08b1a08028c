//! PostgreSQL implementation of user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{NewUser, User, UserPatch};
use crate::domain::errors::AuthError;
use crate::domain::query::{OrganizedQuery, Page, PageRequest};
use crate::domain::repositories::UserRepository;
use crate::infrastructure::persistence::query_builder::{
    push_conditions, push_limit_offset, push_order_by,
};

const COLUMNS: &str =
    "id, name, email, password_hash, email_verified_at, is_admin, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    email_verified_at: Option<DateTime<Utc>>,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            email_verified_at: row.email_verified_at,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn update_query(id: i64, patch: UserPatch) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");

    if let Some(name) = patch.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(email) = patch.email {
        builder.push(", email = ").push_bind(email);
    }
    if let Some(password_hash) = patch.password_hash {
        builder.push(", password_hash = ").push_bind(password_hash);
    }
    if let Some(verified_at) = patch.email_verified_at {
        builder.push(", email_verified_at = ").push_bind(verified_at);
    }
    if let Some(is_admin) = patch.is_admin {
        builder.push(", is_admin = ").push_bind(is_admin);
    }

    builder.push(" WHERE id = ").push_bind(id);
    builder.push(format!(" RETURNING {COLUMNS}"));
    builder
}

/// PostgreSQL repository for users. Emails are unique case-insensitively.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, is_admin, email_verified_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.is_admin)
            .bind(user.email_verified_at)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(AuthError::from_insert)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1");

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn update(&self, id: i64, patch: UserPatch) -> Result<User, AuthError> {
        let row = update_query(id, patch)
            .build_query_as::<UserRow>()
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(AuthError::from_insert)?
            .ok_or_else(|| AuthError::not_found("User not found", json!({ "id": id })))?;

        Ok(row.into())
    }

    async fn update_and_revoke_sessions(
        &self,
        id: i64,
        patch: UserPatch,
    ) -> Result<(User, u64), AuthError> {
        let mut tx = self.pool.begin().await?;

        let row = update_query(id, patch)
            .build_query_as::<UserRow>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(AuthError::from_insert)?
            .ok_or_else(|| AuthError::not_found("User not found", json!({ "id": id })))?;

        let deleted = sqlx::query("DELETE FROM auth_tokens WHERE owner_type = $1 AND owner_id = $2")
            .bind(User::OWNER_TYPE)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok((row.into(), deleted))
    }

    async fn delete(&self, id: i64) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        query: &OrganizedQuery,
        page: PageRequest,
    ) -> Result<Page<User>, AuthError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_conditions(&mut count, query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.as_ref())
            .await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users WHERE TRUE"));
        push_conditions(&mut select, query);
        push_order_by(&mut select, query);
        push_limit_offset(&mut select, page.limit(), page.offset());

        let rows = select
            .build_query_as::<UserRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(Page {
            items: rows.into_iter().map(User::from).collect(),
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }
}
