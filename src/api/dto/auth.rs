//! DTOs for registration, login, refresh and account recovery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::users::UserResponse;
use crate::application::services::IssuedPair;
use crate::domain::entities::User;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,

    #[validate(email(message = "The email must be a valid email address."))]
    #[validate(length(max = 255))]
    pub email: String,

    #[validate(length(min = 8, max = 255, message = "The password must be at least 8 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "The password confirmation does not match."))]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "The token field is required."))]
    pub token: String,

    #[validate(length(min = 8, max = 255, message = "The password must be at least 8 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "The password confirmation does not match."))]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "The token field is required."))]
    pub token: String,
}

/// Response carrying a freshly issued token pair.
///
/// The plaintext tokens appear here once and cannot be retrieved again.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub user: UserResponse,
    pub token_type: &'static str,
    pub access_token: String,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token: String,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

impl TokenPairResponse {
    pub fn new(user: User, pair: IssuedPair) -> Self {
        TokenPairResponse {
            user: user.into(),
            token_type: "Bearer",
            access_token_expires_at: pair.access.expires_at,
            refresh_token_expires_at: pair.refresh.expires_at,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}
