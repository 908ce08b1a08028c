//! Handlers for admin user management.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::api::dto::pagination::{PageMeta, PaginationParams};
use crate::api::dto::users::{AdminUpdateUserRequest, UserListResponse, UserResponse};
use crate::application::services::{AdminUserUpdate, AuthContext};
use crate::domain::entities::User;
use crate::domain::query::organize;
use crate::error::AppError;
use crate::state::AppState;

/// Lists users.
///
/// # Endpoint
///
/// `GET /admin/users`
///
/// Accepts the same `filter` / `search` / `sort` / `page` / `per_page`
/// parameters as `GET /auth/tokens`. Sortable: `name`, `email`, `created_at`.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(raw): Query<Vec<(String, String)>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let page_request = pagination.to_page_request()?;
    let query = organize::<User>(&raw);

    let page = state
        .user_service
        .list(&query, page_request)
        .await?
        .map(UserResponse::from);

    Ok(Json(UserListResponse {
        pagination: PageMeta::from(&page),
        items: page.items,
    }))
}

/// Updates the admin flag or verification state of a user.
///
/// # Endpoint
///
/// `PATCH /admin/users/{id}`
///
/// Changing `is_admin` deletes every session of the target user.
///
/// # Errors
///
/// Returns 400 if an admin tries to remove their own admin role.
/// Returns 404 if the user does not exist.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .user_service
        .update(
            &context.user,
            id,
            AdminUserUpdate {
                is_admin: payload.is_admin,
                email_verified: payload.email_verified,
            },
        )
        .await?;

    Ok(Json(user.into()))
}
