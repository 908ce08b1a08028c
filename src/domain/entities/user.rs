//! User entity: the authenticated principal.

use chrono::{DateTime, Utc};

use crate::domain::query::{Organizable, PropertyType};

/// A registered user.
///
/// `password_hash` is an Argon2id PHC string and never leaves the service.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Owner type stored on tokens issued to users.
    pub const OWNER_TYPE: &'static str = "user";

    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// A user that has not been inserted yet carries a non-positive id.
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

impl Organizable for User {
    fn sortable_properties() -> &'static [&'static str] {
        &["name", "email", "created_at"]
    }

    fn filterable_properties() -> &'static [&'static str] {
        &["name", "email", "is_admin", "email_verified_at", "created_at"]
    }

    fn searchable_properties() -> &'static [&'static str] {
        &["name", "email"]
    }

    fn property_type(property: &str) -> PropertyType {
        match property {
            "is_admin" => PropertyType::Boolean,
            "email_verified_at" | "created_at" => PropertyType::Timestamp,
            _ => PropertyType::Text,
        }
    }
}

/// Input data for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
}

/// Partial update of a user. `None` leaves the column unchanged.
///
/// `email_verified_at: Some(None)` clears verification, `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub email_verified_at: Option<Option<DateTime<Utc>>>,
    pub is_admin: Option<bool>,
}
