//! Rate limiting for credential endpoints using a token bucket.

use anyhow::anyhow;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use serde_json::json;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    GovernorError, GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::error::AppError;

/// Keys buckets by client IP.
///
/// Uses the socket peer address, or the `X-Forwarded-For` / `X-Real-IP` /
/// `Forwarded` headers when the service runs behind a trusted proxy.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    behind_proxy: bool,
}

impl ClientIpKeyExtractor {
    pub fn new(behind_proxy: bool) -> Self {
        Self { behind_proxy }
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.behind_proxy {
            SmartIpKeyExtractor.extract(req)
        } else {
            PeerIpKeyExtractor.extract(req)
        }
    }
}

pub type ThrottleLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Creates the limiter for login, registration, refresh and password recovery.
///
/// # Limits
///
/// - **Burst**: `per_minute` requests
/// - **Refill**: one request every `60 / per_minute` seconds
///
/// Requests exceeding the limit receive `429 Too Many Requests` with the
/// usual JSON error body and a `retry-after` header.
///
/// # Example
///
/// ```rust,ignore
/// let throttled = Router::new()
///     .route("/auth/login", post(login_handler))
///     .layer(rate_limit::layer(60, false)?);
/// ```
pub fn layer(per_minute: u32, behind_proxy: bool) -> anyhow::Result<ThrottleLayer> {
    if per_minute == 0 {
        return Err(anyhow!("throttle rate must be at least 1 request per minute"));
    }

    let governor_conf = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(behind_proxy))
        .period(Duration::from_millis(60_000 / u64::from(per_minute)))
        .burst_size(per_minute)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit configuration"))?;

    Ok(GovernorLayer::new(Arc::new(governor_conf)).error_handler(throttled_response))
}

/// Renders limiter rejections through [`AppError`], keeping governor's headers.
fn throttled_response(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut response = AppError::too_many_requests(
                "Too many attempts. Please try again later.",
                json!({ "retry_after": wait_time }),
            )
            .into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::internal("Unable to determine client address", json!({})).into_response()
        }
        GovernorError::Other { code, msg, headers } => {
            let mut response = AppError::internal(
                msg.unwrap_or_else(|| "Rate limiter error".to_string()),
                json!({ "status": code.as_u16() }),
            )
            .into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
    }
}
