//! Common HTTP types used throughout the pipeline.
//!
//! This module re-exports the request and response types the middleware
//! chain operates on, plus a small set of response builders.

use bytes::Bytes;
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;

/// The HTTP request type flowing through the pipeline.
///
/// A standard `http::Request` with a fully-buffered `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed future, used for type-erased middleware and hooks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An owned snapshot of a request's head, without the body.
///
/// Hooks return `'static` futures and so cannot borrow the live request;
/// they receive this snapshot instead. Cloning the header map is cheap
/// relative to the I/O a hook performs.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Request method.
    pub method: http::Method,
    /// Request URI.
    pub uri: http::Uri,
    /// Request headers.
    pub headers: http::HeaderMap,
}

impl RequestHead {
    /// Snapshots the head of a request.
    #[must_use]
    pub fn of(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

/// Extension trait for building common responses.
pub trait ResponseExt {
    /// Creates a plain-text error response.
    fn error(status: http::StatusCode, message: &str) -> Response;

    /// Creates a JSON error response with a machine-readable code.
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response;

    /// Creates a `302 Found` redirect to the given location.
    fn redirect(location: &str) -> Response;

    /// Creates a `401 Unauthorized` response with an empty body.
    fn unauthorized() -> Response;
}

impl ResponseExt for Response {
    fn error(status: http::StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("failed to build error response")
    }

    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("failed to build JSON error response")
    }

    fn redirect(location: &str) -> Response {
        http::Response::builder()
            .status(http::StatusCode::FOUND)
            .header(http::header::LOCATION, location)
            .body(Full::new(Bytes::new()))
            .expect("failed to build redirect response")
    }

    fn unauthorized() -> Response {
        http::Response::builder()
            .status(http::StatusCode::UNAUTHORIZED)
            .body(Full::new(Bytes::new()))
            .expect("failed to build unauthorized response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_error_response() {
        let response = Response::error(StatusCode::BAD_REQUEST, "Invalid input");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_redirect_response() {
        let response = Response::redirect("/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(http::header::LOCATION).unwrap(),
            "/login"
        );
    }

    #[test]
    fn test_unauthorized_is_empty() {
        let response = Response::unauthorized();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(http::header::LOCATION).is_none());
    }
}
