//! DTOs for the current user and admin user management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::pagination::PageMeta;
use crate::domain::entities::User;

/// Public view of a user. Never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            name: u.name,
            email: u.email,
            email_verified_at: u.email_verified_at,
            is_admin: u.is_admin,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    pub pagination: PageMeta,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "The current password field is required."))]
    pub current_password: String,

    #[validate(length(min = 8, max = 255, message = "The password must be at least 8 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "The password confirmation does not match."))]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeEmailRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    #[validate(length(max = 255))]
    pub email: String,

    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

/// Partial admin update. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub is_admin: Option<bool>,
    pub email_verified: Option<bool>,
}
