//! Candidate address derivation
//!
//! The whitelist sees a plain address string. Behind a proxy that is the
//! first hop recorded in `X-Forwarded-For`; otherwise it is the peer address.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Proxy header carrying the original client address
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Address string the whitelist should evaluate for this request
pub fn client_ip(headers: &HeaderMap, peer: IpAddr) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map_or_else(|| format_peer(peer), str::to_string)
}

/// Render a peer address the way the whitelist rules expect it.
///
/// IPv4-mapped peers from dual-stack sockets become dotted quads; other IPv6
/// peers use the uncompressed form (`0:0:0:0:0:0:0:1`).
pub fn format_peer(peer: IpAddr) -> String {
    match peer {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6
                .segments()
                .iter()
                .map(|s| format!("{s:x}"))
                .collect::<Vec<_>>()
                .join(":"),
        },
    }
}
