//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod admin;
pub mod auth;
pub mod health;
pub mod tokens;
pub mod users;

pub use admin::{list_users_handler, update_user_handler};
pub use auth::{
    forgot_password_handler, login_handler, logout_handler, refresh_handler, register_handler,
    resend_verification_handler, reset_password_handler, verify_email_handler,
};
pub use health::health_handler;
pub use tokens::{delete_token_handler, list_tokens_handler, truncate_tokens_handler};
pub use users::{change_email_handler, change_password_handler, delete_account_handler, me_handler};
