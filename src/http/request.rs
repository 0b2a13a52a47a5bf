//! Request identification and inbound URL reconstruction.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Rebuild the absolute URL the client asked for, which the cache key
//!   is derived from
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A configured public origin wins over the `Host` header so keys do not
//!   depend on how the proxy was reached

use axum::http::{header::HOST, HeaderMap, HeaderName, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        Uuid::new_v4().to_string().parse().ok().map(RequestId::new)
    }
}

/// Request ID of `headers`, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Absolute inbound URL: `public_origin` (or `http://` + `Host`) joined with
/// the request path and its original query string.
///
/// An unusable `Host` falls back to `localhost` so the key stays stable.
pub fn inbound_url(
    uri: &Uri,
    headers: &HeaderMap,
    public_origin: Option<&Url>,
) -> Result<Url, url::ParseError> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let origin = match public_origin {
        Some(origin) => origin.as_str().trim_end_matches('/').to_string(),
        None => {
            let host = headers
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .or_else(|| uri.authority().map(|a| a.as_str()))
                .unwrap_or("localhost");
            format!("http://{}", host)
        }
    };

    Url::parse(&format!("{}{}", origin, path_and_query)).or_else(|e| {
        tracing::debug!(error = %e, %origin, "Unparseable inbound origin; using localhost");
        Url::parse(&format!("http://localhost{}", path_and_query))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_inbound_from_host_header() {
        let uri: Uri = "/?url=%2Fa.png&w=10".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("img.shop.test:8080"));

        let url = inbound_url(&uri, &headers, None).unwrap();
        assert_eq!(url.as_str(), "http://img.shop.test:8080/?url=%2Fa.png&w=10");
    }

    #[test]
    fn test_public_origin_wins() {
        let uri: Uri = "/resize?w=10&url=%2Fa.png".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("10.0.0.7"));
        let origin = Url::parse("https://img.shop.test").unwrap();

        let url = inbound_url(&uri, &headers, Some(&origin)).unwrap();
        assert_eq!(url.as_str(), "https://img.shop.test/resize?w=10&url=%2Fa.png");
    }

    #[test]
    fn test_bad_host_falls_back() {
        let uri: Uri = "/?w=1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("bad host"));

        let url = inbound_url(&uri, &headers, None).unwrap();
        assert_eq!(url.as_str(), "http://localhost/?w=1");
    }

    #[test]
    fn test_request_id_generation() {
        let request = Request::builder().uri("/").body(()).unwrap();
        let id = UuidRequestId.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }
}
