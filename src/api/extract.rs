//! Request extractors shared by handlers and middleware.

use axum::extract::{ConnectInfo, FromRequestParts, Query};
use axum::http::request::Parts;
use axum_auth::AuthBearer;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::domain::entities::RequestMeta;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_info::{client_ip, host_from_headers, user_agent};

/// Client metadata stamped on issued tokens.
///
/// The peer address is read from [`ConnectInfo`] when the server was started
/// with it; proxy headers are honoured only when `behind_proxy` is set.
#[derive(Debug, Clone)]
pub struct ClientMeta(pub RequestMeta);

impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientMeta(RequestMeta {
            ip_address: client_ip(&parts.headers, peer, state.behind_proxy),
            ip_host: host_from_headers(&parts.headers),
            user_agent: user_agent(&parts.headers),
        }))
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Reads the bearer token of a request.
///
/// The `Authorization: Bearer` header wins; the `?token=` query parameter is
/// consulted only when `allow_query` is set.
pub async fn presented_token(parts: &mut Parts, allow_query: bool) -> Option<String> {
    if let Ok(AuthBearer(token)) = AuthBearer::from_request_parts(parts, &()).await {
        return Some(token);
    }

    if !allow_query {
        return None;
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty())
}

/// Bearer token taken from the `Authorization` header only.
///
/// Used by the refresh endpoint, which validates the token itself.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        presented_token(parts, false)
            .await
            .map(BearerToken)
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthenticated.",
                    json!({ "reason": "unauthenticated" }),
                )
            })
    }
}
