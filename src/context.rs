//! Immutable snapshot of the inbound request.
//!
//! The original encoder read ambient per-request globals mid-computation;
//! here everything the builders need is captured once at handler entry, so
//! URL and cookie construction stay pure and independently testable.

use axum::http::{HeaderMap, Uri};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::warn;

use crate::config::TrustedProxyMode;

/// Everything the tracker reads from the inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Path and query of the tracked request.
    pub path: String,
    /// Absolute URL of the tracked request.
    pub full_url: String,
    /// Client address after trust evaluation (and anonymization, if enabled).
    pub client_address: String,
    /// Host name reported to the collector.
    pub server_name: String,
    /// Referer header, `-` when absent.
    pub referer: String,
    pub user_agent: String,
    pub accept_language: String,
}

impl RequestContext {
    /// Capture a snapshot from an axum request's parts.
    ///
    /// `server_name` overrides the Host header when configured.
    pub fn from_request(
        headers: &HeaderMap,
        uri: &Uri,
        socket_addr: IpAddr,
        server_name: Option<&str>,
        trust: TrustedProxyMode,
        anonymize: bool,
    ) -> Self {
        let server_name = server_name
            .map(str::to_string)
            .or_else(|| header_value(headers, "host"))
            .unwrap_or_default();

        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        let full_url = format!("http://{server_name}{path}");

        let mut client_ip = extract_client_ip(headers, socket_addr, trust);
        if anonymize {
            client_ip = anonymize_ip(client_ip);
        }

        Self {
            path,
            full_url,
            client_address: client_ip.to_string(),
            server_name,
            referer: header_value(headers, "referer")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "-".to_string()),
            user_agent: header_value(headers, "user-agent").unwrap_or_default(),
            accept_language: header_value(headers, "accept-language").unwrap_or_default(),
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Pick the client address according to the proxy trust mode, falling back
/// to the socket peer address.
fn extract_client_ip(headers: &HeaderMap, socket_addr: IpAddr, trust: TrustedProxyMode) -> IpAddr {
    match trust {
        TrustedProxyMode::None => socket_addr,
        TrustedProxyMode::Cloudflare => headers
            .get("cf-connecting-ip")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<IpAddr>().ok())
            .unwrap_or_else(|| {
                warn!("CF-Connecting-IP header missing in Cloudflare mode, using socket address");
                socket_addr
            }),
        // Rightmost X-Forwarded-For entry: the hop appended by our own proxy.
        TrustedProxyMode::Standard => headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|xff| {
                xff.split(',')
                    .filter_map(|s| s.trim().parse::<IpAddr>().ok())
                    .next_back()
            })
            .unwrap_or(socket_addr),
    }
}

/// Mask an address to its network prefix: /24 for IPv4, /48 for IPv6.
pub fn anonymize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(addr) => {
            let octets = addr.octets();
            IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], 0))
        }
        IpAddr::V6(addr) => {
            let segments = addr.segments();
            IpAddr::V6(Ipv6Addr::new(
                segments[0],
                segments[1],
                segments[2],
                0,
                0,
                0,
                0,
                0,
            ))
        }
    }
}
