//! HTTP-facing error type.
//!
//! Handlers and middleware return [`AppError`]; it renders as
//!
//! ```json
//! { "message": "Your email address is not verified.", "code": "unauthorized", "reason": "unverified" }
//! ```
//!
//! Extra context from `details` is merged into the top-level object. The
//! conversion from [`AuthError`] below is the only place where domain errors
//! acquire an HTTP status.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::errors::{AuthError, PolicyReason};

/// When false (production), 500 responses carry a generic message only.
static EXPOSE_INTERNAL_DETAILS: AtomicBool = AtomicBool::new(false);

/// Enables or disables internal error details in responses (`APP_DEBUG`).
pub fn set_expose_internal_details(enabled: bool) {
    EXPOSE_INTERNAL_DETAILS.store(enabled, Ordering::Relaxed);
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    Forbidden { message: String, details: Value },
    NotFound { message: String, details: Value },
    Conflict { message: String, details: Value },
    TooManyRequests { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
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
    pub fn too_many_requests(message: impl Into<String>, details: Value) -> Self {
        Self::TooManyRequests {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::Unauthorized { message, details } => ("unauthorized", message, details),
            AppError::Forbidden { message, details } => ("forbidden", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Conflict { message, details } => ("conflict", message, details),
            AppError::TooManyRequests { message, details } => {
                ("too_many_requests", message, details)
            }
            AppError::Internal { message, details } => {
                tracing::error!(%message, ?details, "Internal error");
                if EXPOSE_INTERNAL_DETAILS.load(Ordering::Relaxed) {
                    ("internal_error", message, details)
                } else {
                    ("internal_error", "Server Error".to_string(), json!({}))
                }
            }
        };

        let mut body = Map::new();
        if let Value::Object(extra) = details {
            body.extend(extra);
        }
        body.insert("message".to_string(), Value::String(message));
        body.insert("code".to_string(), Value::String(code.to_string()));

        let mut response = (status, Json(Value::Object(body))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MalformedToken => {
                AppError::unauthorized("Unauthenticated.", json!({ "reason": "malformed_token" }))
            }
            AuthError::InvalidToken => {
                AppError::unauthorized("Unauthenticated.", json!({ "reason": "invalid_token" }))
            }
            AuthError::Unauthenticated => {
                AppError::unauthorized("Unauthenticated.", json!({ "reason": "unauthenticated" }))
            }
            AuthError::InvalidCredentials => AppError::unauthorized(
                "These credentials do not match our records.",
                json!({ "reason": "invalid_credentials" }),
            ),
            AuthError::PolicyViolation(reason) => match reason {
                PolicyReason::Unverified => AppError::unauthorized(
                    "Your email address is not verified.",
                    json!({ "reason": reason.as_str() }),
                ),
                PolicyReason::Deleted => {
                    AppError::unauthorized("Unauthenticated.", json!({ "reason": reason.as_str() }))
                }
                PolicyReason::Forbidden => AppError::forbidden(
                    "This action is unauthorized.",
                    json!({ "reason": reason.as_str() }),
                ),
            },
            AuthError::RegistrationDisabled => AppError::forbidden(
                "Registration is disabled.",
                json!({ "reason": "registration_disabled" }),
            ),
            AuthError::InvalidPrincipal => {
                AppError::internal("Invalid principal", json!({ "error": e.to_string() }))
            }
            AuthError::NotFound { message, details } => AppError::not_found(message, details),
            AuthError::Validation { message, details } => AppError::bad_request(message, details),
            AuthError::Conflict { message, details } => AppError::conflict(message, details),
            AuthError::Storage(ref err) => {
                AppError::internal("Database error", json!({ "error": err.to_string() }))
            }
            AuthError::Internal(message) => AppError::internal(message, json!({})),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Storage(e).into()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("The given data was invalid.", json!({ "errors": e }))
    }
}
