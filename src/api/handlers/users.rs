//! Handlers for the signed-in user's own account.

use axum::{Extension, Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::auth::TokenPairResponse;
use crate::api::dto::users::{
    ChangeEmailRequest, ChangePasswordRequest, DeleteAccountRequest, UserResponse,
};
use crate::api::extract::ClientMeta;
use crate::application::services::AuthContext;
use crate::error::AppError;
use crate::state::AppState;

/// `GET /users/me`
pub async fn me_handler(Extension(context): Extension<AuthContext>) -> Json<UserResponse> {
    Json(context.user.into())
}

/// Changes the password.
///
/// # Endpoint
///
/// `PUT /users/me/password`
///
/// All existing sessions are deleted; the response carries a new pair.
///
/// # Errors
///
/// Returns 400 if `current_password` is wrong or the new one is invalid.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    payload.validate()?;

    let pair = state
        .account_service
        .change_password(
            &context.user,
            payload.current_password,
            payload.password,
            &meta,
        )
        .await?;

    let user = state.user_service.get(context.user.id).await?;
    Ok(Json(TokenPairResponse::new(user, pair)))
}

/// Changes the email address.
///
/// # Endpoint
///
/// `PUT /users/me/email`
///
/// The new address starts unverified and a verification link is mailed to it.
/// All existing sessions are deleted; the response carries a new pair.
///
/// # Errors
///
/// Returns 400 if `password` is wrong.
/// Returns 409 if the address belongs to another account.
pub async fn change_email_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    ClientMeta(meta): ClientMeta,
    Json(payload): Json<ChangeEmailRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    payload.validate()?;

    let (user, pair) = state
        .account_service
        .change_email(
            &context.user,
            payload.email.trim().to_string(),
            payload.password,
            &meta,
        )
        .await?;

    Ok(Json(TokenPairResponse::new(user, pair)))
}

/// Deletes the account and all of its tokens.
///
/// # Endpoint
///
/// `DELETE /users/me`
pub async fn delete_account_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .account_service
        .delete_account(&context.user, payload.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
