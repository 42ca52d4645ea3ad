//! Client IP extraction from HTTP headers with trust validation
//!
//! The scan recorder takes the client IP as an explicit input; this module
//! is the single place where it is derived from a request. Which header is
//! trusted, and through how many proxy hops, is configuration.

use axum::http::HeaderMap;
use std::net::IpAddr;
use tracing::warn;

use crate::config::{TrustedProxyConfig, TrustedProxyMode};

/// Extract the client IP address for a request.
///
/// Falls back to the socket remote address whenever the configured headers
/// are missing or unparsable.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: IpAddr,
    config: &TrustedProxyConfig,
) -> IpAddr {
    match config.mode {
        TrustedProxyMode::Cloudflare => extract_cloudflare_ip(headers).unwrap_or_else(|| {
            warn!("CF-Connecting-IP header missing in Cloudflare mode, using socket address");
            socket_addr
        }),
        TrustedProxyMode::Standard => {
            extract_from_x_forwarded_for(headers, config).unwrap_or(socket_addr)
        }
        TrustedProxyMode::None => socket_addr,
    }
}

fn extract_cloudflare_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("cf-connecting-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<IpAddr>().ok())
}

/// Parse X-Forwarded-For with right-to-left trust validation.
fn extract_from_x_forwarded_for(headers: &HeaderMap, config: &TrustedProxyConfig) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;

    let ips: Vec<IpAddr> = xff
        .split(',')
        .filter_map(|s| s.trim().parse::<IpAddr>().ok())
        .collect();

    if ips.is_empty() {
        return None;
    }

    // Fixed hop count: skip that many proxies from the right
    if let Some(num_trusted) = config.num_trusted_proxies {
        if ips.len() > num_trusted {
            return Some(ips[ips.len() - num_trusted - 1]);
        }
        return ips.first().copied();
    }

    // CIDR list: walk right to left, the first address outside the trusted
    // ranges is the client
    if !config.trusted_proxies.is_empty() {
        for ip in ips.iter().rev() {
            let trusted = config.trusted_proxies.iter().any(|net| net.contains(ip));
            if !trusted {
                return Some(*ip);
            }
        }
        // Every hop was a trusted proxy; take the leftmost entry
        return ips.first().copied();
    }

    // No trust configuration, take the rightmost entry
    ips.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(mode: TrustedProxyMode) -> TrustedProxyConfig {
        TrustedProxyConfig {
            mode,
            trusted_proxies: vec![],
            num_trusted_proxies: None,
        }
    }

    #[test]
    fn test_none_mode_uses_socket_address() {
        let headers = HeaderMap::new();
        let socket_addr: IpAddr = "192.168.1.1".parse().unwrap();

        let result = extract_client_ip(&headers, socket_addr, &config(TrustedProxyMode::None));
        assert_eq!(result, socket_addr);
    }

    #[test]
    fn test_cloudflare_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("203.0.113.1"));
        let socket_addr: IpAddr = "192.168.1.1".parse().unwrap();

        let result =
            extract_client_ip(&headers, socket_addr, &config(TrustedProxyMode::Cloudflare));
        assert_eq!(result, "203.0.113.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_x_forwarded_for_rightmost_without_trust_config() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );
        let socket_addr: IpAddr = "192.168.1.1".parse().unwrap();

        let result = extract_client_ip(&headers, socket_addr, &config(TrustedProxyMode::Standard));
        assert_eq!(result, "198.51.100.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_x_forwarded_for_skips_trusted_hops() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );
        let socket_addr: IpAddr = "192.168.1.1".parse().unwrap();
        let mut cfg = config(TrustedProxyMode::Standard);
        cfg.num_trusted_proxies = Some(1);

        let result = extract_client_ip(&headers, socket_addr, &cfg);
        assert_eq!(result, "203.0.113.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_x_forwarded_for_cidr_trust_chain() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 10.0.0.5, 10.0.1.9"),
        );
        let socket_addr: IpAddr = "192.168.1.1".parse().unwrap();
        let mut cfg = config(TrustedProxyMode::Standard);
        cfg.trusted_proxies = vec!["10.0.0.0/8".parse().unwrap()];

        let result = extract_client_ip(&headers, socket_addr, &cfg);
        assert_eq!(result, "203.0.113.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_missing_header_falls_back_to_socket() {
        let headers = HeaderMap::new();
        let socket_addr: IpAddr = "192.168.1.1".parse().unwrap();

        let result = extract_client_ip(&headers, socket_addr, &config(TrustedProxyMode::Standard));
        assert_eq!(result, socket_addr);
    }
}
