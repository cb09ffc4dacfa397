use std::net::IpAddr;

use axum::http::HeaderMap;

/// Headers consulted, in order, when the service sits behind a proxy.
const PROXY_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

/// The visitor's address. Proxy headers are only believed when
/// `trust_proxy_headers` is set, otherwise anyone could pick their country.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_proxy_headers: bool) -> Option<IpAddr> {
    if trust_proxy_headers {
        for name in PROXY_HEADERS {
            let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
                continue;
            };
            // X-Forwarded-For is "client, proxy1, proxy2"; the client is first.
            let first = value.split(',').next().unwrap_or_default().trim();
            if let Ok(ip) = first.parse::<IpAddr>() {
                return Some(ip);
            }
            tracing::debug!(header = name, value, "unparseable client address header");
        }
    }
    peer
}
