//! DTOs for session (token) management.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::dto::pagination::PageMeta;
use crate::domain::entities::AuthToken;

/// A token as shown to its owner. The hash is never exposed.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: i64,
    pub kind: &'static str,
    pub name: String,
    pub group_id: i64,
    pub abilities: Option<Vec<String>>,
    pub ip_address: Option<String>,
    pub ip_host: Option<String>,
    pub user_agent: Option<String>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// True for tokens of the session making the request.
    pub current: bool,
}

impl TokenResponse {
    pub fn new(token: AuthToken, current_group: i64) -> Self {
        TokenResponse {
            id: token.id,
            kind: token.kind.as_str(),
            current: token.group_id == current_group,
            name: token.name,
            group_id: token.group_id,
            abilities: token.abilities,
            ip_address: token.ip_address,
            ip_host: token.ip_host,
            user_agent: token.user_agent,
            revoked_at: token.revoked_at,
            expires_at: token.expires_at,
            created_at: token.created_at,
            updated_at: token.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenListResponse {
    pub items: Vec<TokenResponse>,
    pub pagination: PageMeta,
}
