//! Request metadata extraction from HTTP headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Longest user agent kept on a token row.
const MAX_USER_AGENT_LEN: usize = 512;

/// Extracts the host the client addressed from the `Host` header.
///
/// Handles:
/// - IPv4 addresses (e.g., `192.168.1.1`)
/// - IPv6 addresses (e.g., `[::1]`)
/// - Hostnames with ports (e.g., `example.com:3000`)
/// - Plain hostnames (e.g., `example.com`)
///
/// Port numbers are stripped. Returns `None` when the header is missing or not UTF-8.
pub fn host_from_headers(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(header::HOST)?.to_str().ok()?;

    let host = if host.starts_with('[') {
        // IPv6 address (e.g., [::1] or [::1]:8080)
        match host.find(']') {
            Some(end_bracket) => &host[..=end_bracket],
            None => host,
        }
    } else {
        host.split(':').next().unwrap_or(host)
    };

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Resolves the client IP address.
///
/// When `behind_proxy` is set, the first `X-Forwarded-For` entry (or
/// `X-Real-IP`) wins over the socket peer. Only enable that behind a trusted
/// reverse proxy: the headers are client-controlled otherwise.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, behind_proxy: bool) -> Option<String> {
    if behind_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .and_then(|v| v.parse::<IpAddr>().ok());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
        };

        if let Some(ip) = forwarded.or_else(real_ip) {
            return Some(ip.to_string());
        }
    }

    peer.map(|ip| ip.to_string())
}

/// Returns the `User-Agent` header, truncated to a storable length.
pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    let ua = headers.get(header::USER_AGENT)?.to_str().ok()?.trim();
    if ua.is_empty() {
        return None;
    }

    Some(ua.chars().take(MAX_USER_AGENT_LEN).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};
    use std::net::Ipv4Addr;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_host_simple() {
        let h = headers(&[("host", "example.com")]);
        assert_eq!(host_from_headers(&h).as_deref(), Some("example.com"));
    }

    #[test]
    fn test_host_with_port() {
        let h = headers(&[("host", "api.example.com:443")]);
        assert_eq!(host_from_headers(&h).as_deref(), Some("api.example.com"));
    }

    #[test]
    fn test_host_ipv6_with_port() {
        let h = headers(&[("host", "[::1]:8080")]);
        assert_eq!(host_from_headers(&h).as_deref(), Some("[::1]"));
    }

    #[test]
    fn test_host_missing() {
        assert!(host_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_host_invalid_utf8() {
        let mut h = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_bytes(&[0xFF, 0xFE, 0xFD]) {
            h.insert(header::HOST, value);
            assert!(host_from_headers(&h).is_none());
        }
    }

    #[test]
    fn test_client_ip_uses_peer_by_default() {
        let h = headers(&[("x-forwarded-for", "203.0.113.9")]);
        let peer = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));

        assert_eq!(client_ip(&h, peer, false).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_client_ip_behind_proxy() {
        let peer = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));

        let h = headers(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);
        assert_eq!(client_ip(&h, peer, true).as_deref(), Some("203.0.113.9"));

        let h = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_ip(&h, peer, true).as_deref(), Some("198.51.100.4"));

        let h = headers(&[("x-forwarded-for", "garbage")]);
        assert_eq!(client_ip(&h, peer, true).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_client_ip_unknown() {
        assert!(client_ip(&HeaderMap::new(), None, true).is_none());
    }

    #[test]
    fn test_user_agent() {
        let h = headers(&[("user-agent", "Mozilla/5.0")]);
        assert_eq!(user_agent(&h).as_deref(), Some("Mozilla/5.0"));
        assert!(user_agent(&HeaderMap::new()).is_none());
    }
}
