//! Single-use tokens for email verification and password reset.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneTimePurpose {
    EmailVerification,
    PasswordReset,
}

impl OneTimePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OneTimePurpose::EmailVerification => "email_verification",
            OneTimePurpose::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for OneTimePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OneTimePurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(OneTimePurpose::EmailVerification),
            "password_reset" => Ok(OneTimePurpose::PasswordReset),
            other => Err(format!("unknown one-time token purpose '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OneTimeToken {
    pub id: i64,
    pub user_id: i64,
    pub purpose: OneTimePurpose,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOneTimeToken {
    pub user_id: i64,
    pub purpose: OneTimePurpose,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
