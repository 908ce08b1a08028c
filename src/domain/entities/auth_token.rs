//! Auth token entity: one issued access or refresh token.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::domain::query::{Organizable, PropertyType};

/// Kind of a bearer token.
///
/// Access tokens authorize API calls; refresh tokens are only accepted by the
/// refresh endpoint, where they are exchanged for a new pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenKind::Access),
            "refresh" => Ok(TokenKind::Refresh),
            other => Err(format!("unknown token kind '{other}'")),
        }
    }
}

/// Request metadata captured when a token is issued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    /// Host the client addressed (`Host` header, port stripped).
    pub ip_host: Option<String>,
    pub user_agent: Option<String>,
}

/// A persisted token row.
///
/// Only the HMAC of the secret is stored; the plaintext leaves the server once,
/// in the response that issued it.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub id: i64,
    pub kind: TokenKind,
    pub owner_id: i64,
    pub owner_type: String,
    pub group_id: i64,
    pub name: String,
    pub token_hash: String,
    pub abilities: Option<Vec<String>>,
    pub ip_address: Option<String>,
    pub ip_host: Option<String>,
    pub user_agent: Option<String>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Returns true once `expires_at` has passed. Tokens without expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }
}

impl Organizable for AuthToken {
    fn sortable_properties() -> &'static [&'static str] {
        &["name", "kind", "created_at", "updated_at", "expires_at"]
    }

    fn filterable_properties() -> &'static [&'static str] {
        &[
            "kind",
            "name",
            "group_id",
            "ip_address",
            "user_agent",
            "expires_at",
            "revoked_at",
            "created_at",
        ]
    }

    fn searchable_properties() -> &'static [&'static str] {
        &["name", "ip_address", "ip_host", "user_agent"]
    }

    fn property_type(property: &str) -> PropertyType {
        match property {
            "group_id" => PropertyType::Integer,
            "expires_at" | "revoked_at" | "created_at" | "updated_at" => PropertyType::Timestamp,
            _ => PropertyType::Text,
        }
    }
}

/// Input for inserting a token row.
#[derive(Debug, Clone)]
pub struct NewAuthToken {
    pub kind: TokenKind,
    pub owner_id: i64,
    pub owner_type: String,
    pub group_id: i64,
    pub name: String,
    pub token_hash: String,
    pub abilities: Option<Vec<String>>,
    pub meta: RequestMeta,
    pub expires_at: Option<DateTime<Utc>>,
}
