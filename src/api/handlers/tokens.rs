//! Handlers for listing and deleting the caller's sessions.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::api::dto::pagination::{PageMeta, PaginationParams};
use crate::api::dto::tokens::{TokenListResponse, TokenResponse};
use crate::application::services::AuthContext;
use crate::domain::entities::AuthToken;
use crate::domain::query::organize;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the caller's tokens.
///
/// # Endpoint
///
/// `GET /auth/tokens`
///
/// # Query Parameters
///
/// - `filter[prop]` / `filter[prop][op]`: `op` is one of `not`, `like`, `in`,
///   `notin`, `lt`, `le`, `ge`, `gt`; `%00` stands for `NULL`
/// - `search`: matches `name`, `ip_address`, `ip_host`, `user_agent`
/// - `sort`: comma-separated, `-` prefix for descending
/// - `page` / `per_page`
///
/// Unknown properties and malformed filters are ignored.
pub async fn list_tokens_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Query(raw): Query<Vec<(String, String)>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<TokenListResponse>, AppError> {
    let page_request = pagination.to_page_request()?;
    let query = organize::<AuthToken>(&raw);

    let page = state
        .auth_service
        .list_tokens(context.user.id, &query, page_request)
        .await?;

    let current_group = context.token.group_id;
    let page = page.map(|t| TokenResponse::new(t, current_group));

    Ok(Json(TokenListResponse {
        pagination: PageMeta::from(&page),
        items: page.items,
    }))
}

/// Deletes the session that a token belongs to.
///
/// # Endpoint
///
/// `DELETE /auth/tokens/{id}`
///
/// # Errors
///
/// Returns 404 if the token does not exist or belongs to another user.
pub async fn delete_token_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .auth_service
        .delete_token_group(context.user.id, id)
        .await?;

    tracing::info!(user_id = context.user.id, token_id = id, deleted, "Deleted session");
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes every token of the caller, including the one in use.
///
/// # Endpoint
///
/// `DELETE /auth/tokens`
pub async fn truncate_tokens_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    state.auth_service.truncate_tokens(context.user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
