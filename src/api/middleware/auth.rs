//! Bearer token authorization middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::extract::presented_token;
use crate::domain::entities::TokenKind;
use crate::domain::errors::{AuthError, PolicyReason};
use crate::error::AppError;
use crate::state::AppState;

/// What a route demands of the presented token and its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    pub kind: TokenKind,
    pub require_verified: bool,
    pub require_admin: bool,
    pub allow_query_token: bool,
}

impl RoutePolicy {
    /// Any valid access token.
    pub const fn access() -> Self {
        Self {
            kind: TokenKind::Access,
            require_verified: false,
            require_admin: false,
            allow_query_token: false,
        }
    }

    pub const fn verified(mut self) -> Self {
        self.require_verified = true;
        self
    }

    /// Implies a verified email.
    pub const fn admin(mut self) -> Self {
        self.require_verified = true;
        self.require_admin = true;
        self
    }

    pub const fn with_query_token(mut self) -> Self {
        self.allow_query_token = true;
        self
    }
}

/// State of one guarded route group.
#[derive(Clone)]
pub struct Guard {
    pub app: AppState,
    pub policy: RoutePolicy,
}

impl Guard {
    pub fn new(app: AppState, policy: RoutePolicy) -> Self {
        Self { app, policy }
    }
}

/// Authenticates the request and enforces the route policy.
///
/// # Token Sources
///
/// ```text
/// Authorization: Bearer <id>.<secret>
/// ?token=<id>.<secret>          (only if the policy allows it)
/// ```
///
/// # Checks
///
/// Evaluated in order, stopping at the first failure:
///
/// 1. A token is present (`401`, reason `unauthenticated`)
/// 2. The token parses, is of the kind the route expects, and is neither
///    revoked nor expired (`401`, reason `malformed_token` / `invalid_token`)
/// 3. The owner's email is verified, if required (`401`, reason `unverified`)
/// 4. The owner is an admin, if required (`403`, reason `forbidden`)
///
/// On success the [`AuthContext`](crate::application::services::AuthContext)
/// is inserted into the request extensions for handlers to pick up with
/// `Extension<AuthContext>`.
///
/// # Example
///
/// ```rust,ignore
/// let admin = Router::new()
///     .route("/admin/users", get(list_users_handler))
///     .route_layer(middleware::from_fn_with_state(
///         Guard::new(state.clone(), RoutePolicy::access().admin()),
///         auth::layer,
///     ));
/// ```
pub async fn layer(
    State(guard): State<Guard>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let policy = guard.policy;

    let token = presented_token(&mut parts, policy.allow_query_token)
        .await
        .ok_or(AuthError::Unauthenticated)?;

    let context = guard
        .app
        .auth_service
        .authenticate(&token, policy.kind)
        .await?;

    if policy.require_verified && !context.user.is_email_verified() {
        tracing::debug!(user_id = context.user.id, "Rejected unverified user");
        return Err(AuthError::PolicyViolation(PolicyReason::Unverified).into());
    }

    if policy.require_admin && !context.user.is_admin {
        tracing::warn!(user_id = context.user.id, "Rejected non-admin user");
        return Err(AuthError::PolicyViolation(PolicyReason::Forbidden).into());
    }

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_builders() {
        let p = RoutePolicy::access();
        assert_eq!(p.kind, TokenKind::Access);
        assert!(!p.require_verified && !p.require_admin && !p.allow_query_token);

        let p = RoutePolicy::access().admin();
        assert!(p.require_verified && p.require_admin);

        let p = RoutePolicy::access().verified().with_query_token();
        assert!(p.require_verified && p.allow_query_token && !p.require_admin);
    }
}
