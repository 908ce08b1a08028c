//! Business logic services for the application layer.

pub mod account_service;
pub mod auth_service;
pub mod token_issuer;
pub mod token_rotation;
pub mod user_service;

pub use account_service::{AccountService, AccountSettings};
pub use auth_service::{AuthContext, AuthService, AuthSettings, Registration};
pub use token_issuer::{IssuedPair, TokenIssuer, TokenLifetimes};
pub use token_rotation::TokenRotation;
pub use user_service::{AdminUserUpdate, UserService};
