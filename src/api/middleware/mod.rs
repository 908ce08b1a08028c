//! HTTP middleware for request processing and protection.
//!
//! Provides bearer token authorization, throttling of credential endpoints,
//! and request tracing.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
