//! Domain layer containing entities, repository contracts and the query model.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures (tokens, users, one-time tokens)
//! - [`repositories`] - Data access trait definitions
//! - [`query`] - Allow-listed filter/search/sort parsing for list endpoints
//! - [`errors`] - The typed [`errors::AuthError`] shared by every layer below HTTP
//! - [`notifications`] - The [`notifications::Mailer`] used for account emails
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])
//!
//! # Session Lifecycle
//!
//! 1. Login issues a refresh/access pair sharing a fresh `group_id`
//! 2. Every request presents the access token to the auth middleware
//! 3. Refresh revokes the presented refresh token and issues a new pair in the same group
//! 4. Logout revokes the whole group

pub mod entities;
pub mod errors;
pub mod notifications;
pub mod query;
pub mod repositories;
