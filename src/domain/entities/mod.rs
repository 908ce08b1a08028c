//! Core domain entities of the authentication subsystem.
//!
//! Entities are plain data structures. Separate `New*` structs describe rows
//! about to be inserted and `*Patch` structs describe partial updates.
//!
//! # Entity Types
//!
//! - [`AuthToken`] - An issued access or refresh token
//! - [`User`] - The authenticated principal
//! - [`OneTimeToken`] - Email verification or password reset token

pub mod auth_token;
pub mod one_time_token;
pub mod user;

pub use auth_token::{AuthToken, NewAuthToken, RequestMeta, TokenKind};
pub use one_time_token::{NewOneTimeToken, OneTimePurpose, OneTimeToken};
pub use user::{NewUser, User, UserPatch};
