//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern. They
//! are implemented by concrete repositories in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`TokenRepository`] - Access/refresh token rows
//! - [`UserRepository`] - Principals
//! - [`OneTimeTokenRepository`] - Email verification and password reset tokens
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod one_time_token_repository;
pub mod token_repository;
pub mod user_repository;

pub use one_time_token_repository::OneTimeTokenRepository;
pub use token_repository::TokenRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use one_time_token_repository::MockOneTimeTokenRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
