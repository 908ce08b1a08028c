//! Handlers for registration, login, refresh and account recovery.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::auth::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    TokenPairResponse, VerifyEmailRequest,
};
use crate::api::extract::{BearerToken, ClientMeta};
use crate::application::services::{AuthContext, Registration};
use crate::error::AppError;
use crate::state::AppState;

/// Creates an account and returns its first token pair.
///
/// # Endpoint
///
/// `POST /auth/register`
///
/// A verification link is mailed to the new address; failure to send it
/// does not fail the registration.
///
/// # Errors
///
/// Returns 400 on validation errors.
/// Returns 403 if registration is disabled.
/// Returns 409 if the email is already taken.
pub async fn register_handler(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenPairResponse>), AppError> {
    payload.validate()?;

    let (user, pair) = state
        .auth_service
        .register(
            Registration {
                name: payload.name.trim().to_string(),
                email: payload.email.trim().to_string(),
                password: payload.password,
            },
            &meta,
        )
        .await?;

    if let Err(e) = state.account_service.send_verification(&user).await {
        tracing::warn!(user_id = user.id, error = %e, "Failed to send verification email");
    }

    Ok((StatusCode::CREATED, Json(TokenPairResponse::new(user, pair))))
}

/// Exchanges credentials for a token pair.
///
/// # Endpoint
///
/// `POST /auth/login`
///
/// # Errors
///
/// Returns 401 with one generic message whether the email is unknown or the
/// password is wrong.
pub async fn login_handler(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<TokenPairResponse>), AppError> {
    payload.validate()?;

    let (user, pair) = state
        .auth_service
        .login(payload.email.trim(), &payload.password, &meta)
        .await?;

    Ok((StatusCode::CREATED, Json(TokenPairResponse::new(user, pair))))
}

/// Rotates the refresh token in the `Authorization` header.
///
/// # Endpoint
///
/// `POST /auth/refresh`
///
/// The presented refresh token is revoked; the response carries its
/// replacement and a new access token in the same session.
///
/// # Errors
///
/// Returns 401 if the token is missing, malformed, an access token, revoked,
/// expired, or was already rotated.
pub async fn refresh_handler(
    State(state): State<AppState>,
    ClientMeta(meta): ClientMeta,
    BearerToken(token): BearerToken,
) -> Result<(StatusCode, Json<TokenPairResponse>), AppError> {
    let (user, pair) = state.auth_service.refresh(&token, &meta).await?;

    Ok((StatusCode::CREATED, Json(TokenPairResponse::new(user, pair))))
}

/// Revokes the whole session of the current access token.
///
/// # Endpoint
///
/// `POST /auth/logout`
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    state.auth_service.logout(&context).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mails a password reset link.
///
/// # Endpoint
///
/// `POST /auth/forgot-password`
///
/// Always answers `202 Accepted`, whether or not the address is registered.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .account_service
        .forgot_password(payload.email.trim())
        .await?;

    Ok(StatusCode::ACCEPTED)
}

/// Sets a new password from a reset token and ends every session.
///
/// # Endpoint
///
/// `POST /auth/reset-password`
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .account_service
        .reset_password(&payload.token, payload.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Confirms the email address with the token from the verification link.
///
/// # Endpoint
///
/// `POST /auth/email/verify`
///
/// # Errors
///
/// Returns 401 if the token is unknown, used or expired.
pub async fn verify_email_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    let user = state.account_service.verify_email(&payload.token).await?;
    tracing::debug!(user_id = context.user.id, verified_user_id = user.id, "Verification link used");

    Ok(StatusCode::NO_CONTENT)
}

/// Mails a fresh verification link.
///
/// # Endpoint
///
/// `POST /auth/email/resend`
pub async fn resend_verification_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    state.account_service.send_verification(&context.user).await?;
    Ok(StatusCode::ACCEPTED)
}
