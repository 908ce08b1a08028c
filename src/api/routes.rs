//! API route configuration.
//!
//! Routes are grouped by the [`RoutePolicy`] they require; each group gets
//! its own [`auth::layer`] guard. Credential endpoints are throttled per
//! client IP instead.

use crate::api::handlers::{
    change_email_handler, change_password_handler, delete_account_handler, delete_token_handler,
    forgot_password_handler, list_tokens_handler, list_users_handler, login_handler,
    logout_handler, me_handler, refresh_handler, register_handler, resend_verification_handler,
    reset_password_handler, truncate_tokens_handler, update_user_handler, verify_email_handler,
};
use crate::api::middleware::auth::{self, Guard, RoutePolicy};
use crate::api::middleware::rate_limit;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};

/// Credential endpoints, limited to `per_minute` requests per client IP.
///
/// # Endpoints
///
/// - `POST /auth/register`
/// - `POST /auth/login`
/// - `POST /auth/refresh`          - Refresh token in `Authorization`
/// - `POST /auth/forgot-password`
/// - `POST /auth/reset-password`
pub fn throttled_routes(behind_proxy: bool, per_minute: u32) -> anyhow::Result<Router<AppState>> {
    Ok(Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/forgot-password", post(forgot_password_handler))
        .route("/auth/reset-password", post(reset_password_handler))
        .layer(rate_limit::layer(per_minute, behind_proxy)?))
}

/// Routes open to any valid access token.
///
/// # Endpoints
///
/// - `GET  /users/me`              - Also accepts `?token=`
/// - `POST /auth/logout`
/// - `POST /auth/email/verify`
/// - `POST /auth/email/resend`
pub fn access_routes(state: &AppState) -> Router<AppState> {
    let me = Router::new()
        .route("/users/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(state.clone(), RoutePolicy::access().with_query_token()),
            auth::layer,
        ));

    Router::new()
        .route("/auth/logout", post(logout_handler))
        .route("/auth/email/verify", post(verify_email_handler))
        .route("/auth/email/resend", post(resend_verification_handler))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(state.clone(), RoutePolicy::access()),
            auth::layer,
        ))
        .merge(me)
}

/// Routes that also require a verified email.
///
/// # Endpoints
///
/// - `GET    /auth/tokens`         - Paginated, filterable session list
/// - `DELETE /auth/tokens`         - Delete every session
/// - `DELETE /auth/tokens/{id}`    - Delete the session of one token
/// - `PUT    /users/me/password`
/// - `PUT    /users/me/email`
/// - `DELETE /users/me`
pub fn verified_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/auth/tokens",
            get(list_tokens_handler).delete(truncate_tokens_handler),
        )
        .route("/auth/tokens/{id}", delete(delete_token_handler))
        .route("/users/me/password", put(change_password_handler))
        .route("/users/me/email", put(change_email_handler))
        .route("/users/me", delete(delete_account_handler))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(state.clone(), RoutePolicy::access().verified()),
            auth::layer,
        ))
}

/// Admin routes.
///
/// # Endpoints
///
/// - `GET   /admin/users`
/// - `PATCH /admin/users/{id}`
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users_handler))
        .route("/admin/users/{id}", patch(update_user_handler))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(state.clone(), RoutePolicy::access().admin()),
            auth::layer,
        ))
}
