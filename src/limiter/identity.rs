//! Client identity for rate limiting.

use std::net::SocketAddr;

use http::HeaderMap;

/// Identity used when neither a header nor the peer address is available.
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Derive the rate-limiting identity of a request.
///
/// Walks `lookups` in order and returns the first non-empty value found.
/// Comma-separated headers (`X-Forwarded-For: client, proxy1, proxy2`)
/// contribute their first entry, the originating client. Falls back to the
/// peer address, then to [`UNKNOWN_IDENTITY`].
///
/// The headers are taken at face value.
pub fn client_identity(headers: &HeaderMap, lookups: &[String], peer: Option<SocketAddr>) -> String {
    for name in lookups {
        let Some(value) = headers.get(name.as_str()) else {
            continue;
        };
        let Ok(value) = value.to_str() else {
            continue;
        };
        if let Some(first) = value.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
}
