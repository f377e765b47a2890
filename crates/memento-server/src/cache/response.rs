//! Stored form of an HTTP response.

use axum::body::{Body, Bytes};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use memento_core::CacheStatus;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::CACHE_STATUS_HEADER;

/// Response headers never stored: per-client cookies and hop-by-hop
/// connection headers.
static UNCACHED_HEADERS: [HeaderName; 9] = [
    header::SET_COOKIE,
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// A handler response, buffered so it can be cached and replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body bytes, base64 encoded.
    pub body: String,
}

impl CachedResponse {
    /// Buffers a response head and body.
    ///
    /// Headers that are not valid UTF-8 are dropped, as are `set-cookie`,
    /// hop-by-hop headers and any `x-cache` header the handler set itself.
    pub fn capture(parts: &axum::http::response::Parts, body: &Bytes) -> Self {
        let headers = parts
            .headers
            .iter()
            .filter(|(name, _)| {
                **name != CACHE_STATUS_HEADER && !UNCACHED_HEADERS.contains(name)
            })
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Self {
            status: parts.status.as_u16(),
            headers,
            body: STANDARD.encode(body),
        }
    }

    /// Only successful responses are stored.
    pub fn is_cacheable(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Rebuilds the response, tagged with the given cache status.
    pub fn into_response(self, status: CacheStatus) -> Response {
        let body = match STANDARD.decode(&self.body) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Cached body is not valid base64, replaying empty body");
                Vec::new()
            },
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        headers.insert(
            CACHE_STATUS_HEADER.clone(),
            HeaderValue::from_static(status.as_str()),
        );

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CachedResponse {
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-cache", "stale")
            .body(())
            .unwrap();
        let (parts, _) = response.into_parts();
        CachedResponse::capture(&parts, &Bytes::from(r#"{"id":1}"#))
    }

    #[test]
    fn test_capture_drops_cache_header() {
        let cached = sample();

        assert_eq!(cached.status, 200);
        assert_eq!(
            cached.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        assert!(cached.is_cacheable());
    }

    #[tokio::test]
    async fn test_cookies_and_hop_by_hop_headers_are_not_replayed() {
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain")
            .header(header::SET_COOKIE, "session=abc; HttpOnly")
            .header(header::CONNECTION, "keep-alive")
            .header("keep-alive", "timeout=5")
            .header(header::TRANSFER_ENCODING, "chunked")
            .header(header::CACHE_CONTROL, "max-age=60")
            .body(())
            .unwrap();
        let (parts, _) = response.into_parts();

        let replayed = CachedResponse::capture(&parts, &Bytes::from("ok"))
            .into_response(CacheStatus::Hit);

        let headers = replayed.headers();
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert!(headers.get("keep-alive").is_none());
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=60");
    }

    #[tokio::test]
    async fn test_replay_sets_status_header() {
        let response = sample().into_response(CacheStatus::Hit);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "HIT");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"id":1}"#);
    }

    #[test]
    fn test_non_success_is_not_cacheable() {
        let mut cached = sample();
        cached.status = 404;
        assert!(!cached.is_cacheable());
        cached.status = 500;
        assert!(!cached.is_cacheable());
    }
}
