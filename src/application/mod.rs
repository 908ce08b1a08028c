//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::token_issuer::TokenIssuer`] - Minting of refresh/access pairs
//! - [`services::token_rotation::TokenRotation`] - Single-use refresh token exchange
//! - [`services::auth_service::AuthService`] - Login, registration, bearer authentication, sessions
//! - [`services::account_service::AccountService`] - Email verification, password reset, credential changes
//! - [`services::user_service::UserService`] - Admin user management

pub mod services;
