//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx. Queries
//! are checked at runtime; list queries are assembled with
//! [`sqlx::QueryBuilder`] from an allow-listed
//! [`OrganizedQuery`](crate::domain::query::OrganizedQuery).
//!
//! # Repositories
//!
//! - [`PgTokenRepository`] - Access and refresh tokens
//! - [`PgUserRepository`] - Users
//! - [`PgOneTimeTokenRepository`] - Email verification and password reset tokens

pub mod pg_one_time_token_repository;
pub mod pg_token_repository;
pub mod pg_user_repository;
pub mod query_builder;

pub use pg_one_time_token_repository::PgOneTimeTokenRepository;
pub use pg_token_repository::PgTokenRepository;
pub use pg_user_repository::PgUserRepository;
