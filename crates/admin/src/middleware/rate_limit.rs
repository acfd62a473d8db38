//! Rate limiting for the login and registration endpoints.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Rate-limit key: the client IP.
///
/// Proxy headers are honoured only when `trust_proxy` is set; a directly
/// exposed server keys on the peer address so clients cannot pick their own
/// bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientIpKeyExtractor {
    pub trust_proxy: bool,
}

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

fn peer_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let forwarded = if self.trust_proxy {
            // X-Forwarded-For: first IP in the chain is the client
            header_ip(req, "x-forwarded-for").or_else(|| header_ip(req, "x-real-ip"))
        } else {
            None
        };

        forwarded
            .or_else(|| peer_ip(req))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(5)` are
/// non-zero, which is all `GovernorConfigBuilder::finish` checks.
#[must_use]
pub fn auth_rate_limiter(trust_proxy: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor { trust_proxy })
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    const BEHIND_PROXY: ClientIpKeyExtractor = ClientIpKeyExtractor { trust_proxy: true };
    const DIRECT: ClientIpKeyExtractor = ClientIpKeyExtractor { trust_proxy: false };

    fn request(forwarded_for: Option<&str>, peer: Option<&str>) -> Request<()> {
        let mut builder = Request::builder();
        if let Some(value) = forwarded_for {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut req = builder.body(()).unwrap();
        if let Some(addr) = peer {
            req.extensions_mut()
                .insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        }
        req
    }

    #[test]
    fn test_forwarded_for_takes_first_hop_behind_proxy() {
        let req = request(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.1:443"));
        assert_eq!(
            BEHIND_PROXY.extract(&req).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_forwarded_for_ignored_when_exposed_directly() {
        let first = request(Some("203.0.113.7"), Some("192.0.2.4:5555"));
        let second = request(Some("198.51.100.9"), Some("192.0.2.4:6666"));

        let key = DIRECT.extract(&first).unwrap();
        assert_eq!(key, "192.0.2.4".parse::<IpAddr>().unwrap());
        assert_eq!(DIRECT.extract(&second).unwrap(), key);
    }

    #[test]
    fn test_real_ip_header_behind_proxy() {
        let req = Request::builder()
            .header("x-real-ip", "198.51.100.20")
            .body(())
            .unwrap();
        assert_eq!(
            BEHIND_PROXY.extract(&req).unwrap(),
            "198.51.100.20".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let req = request(None, Some("192.0.2.4:5555"));
        assert_eq!(
            BEHIND_PROXY.extract(&req).unwrap(),
            "192.0.2.4".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_no_source_is_an_error() {
        assert!(DIRECT.extract(&request(Some("203.0.113.7"), None)).is_err());
        assert!(BEHIND_PROXY.extract(&request(None, None)).is_err());
    }
}
