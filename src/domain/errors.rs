//! Typed errors raised by the authentication core.
//!
//! Every component below the HTTP layer (codec, repositories, issuer,
//! rotation, services) returns [`AuthError`]. Translation into HTTP responses
//! happens in exactly one place: `impl From<AuthError> for AppError` in
//! [`crate::error`].

use serde_json::Value;
use thiserror::Error;

/// Reason a valid token was refused by a route policy.
///
/// Serialized into the error body as `reason` so clients can tell
/// "needs email verification" apart from "insufficient role".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyReason {
    /// The principal has not verified its email address.
    Unverified,
    /// The principal lacks the admin role.
    Forbidden,
    /// The principal no longer exists.
    Deleted,
}

impl PolicyReason {
    /// Machine-readable marker exposed to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyReason::Unverified => "unverified",
            PolicyReason::Forbidden => "forbidden",
            PolicyReason::Deleted => "deleted",
        }
    }
}

/// Errors of the token lifecycle and account subsystem.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The bearer token is not structurally parseable.
    #[error("malformed token")]
    MalformedToken,

    /// Well-formed token that is unknown, expired, revoked or of the wrong kind.
    #[error("invalid token")]
    InvalidToken,

    /// No token was presented at all.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Email/password combination rejected. Never says which part was wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("policy violation: {}", .0.as_str())]
    PolicyViolation(PolicyReason),

    /// Attempt to issue tokens for a principal that is not persisted.
    #[error("invalid principal")]
    InvalidPrincipal,

    #[error("registration is disabled")]
    RegistrationDisabled,

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    /// Maps a unique-constraint violation to [`AuthError::Conflict`], everything
    /// else to [`AuthError::Storage`].
    pub fn from_insert(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return Self::conflict(
                "Unique constraint violation",
                serde_json::json!({ "constraint": db.constraint() }),
            );
        }

        Self::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_reason_markers() {
        assert_eq!(PolicyReason::Unverified.as_str(), "unverified");
        assert_eq!(PolicyReason::Forbidden.as_str(), "forbidden");
        assert_eq!(PolicyReason::Deleted.as_str(), "deleted");
    }

    #[test]
    fn test_display_does_not_leak_reason_structure() {
        let err = AuthError::PolicyViolation(PolicyReason::Unverified);
        assert_eq!(err.to_string(), "policy violation: unverified");
    }

    #[test]
    fn test_from_insert_non_database_error_is_storage() {
        let err = AuthError::from_insert(sqlx::Error::RowNotFound);
        assert!(matches!(err, AuthError::Storage(_)));
    }
}
