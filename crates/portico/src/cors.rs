//! CORS stage, installed only when enabled in the application document.
//!
//! Preflight `OPTIONS` requests are answered directly with `204`; other
//! requests continue down the pipeline and get the allow headers stamped
//! onto the response.

use http::{HeaderValue, Method, StatusCode};
use portico_core::{BoxFuture, PorticoResult, Request, RequestContext, Response};
use portico_pipeline::{Middleware, Next};
use std::collections::HashSet;

const ALLOW_ORIGIN: &str = "access-control-allow-origin";
const ALLOW_METHODS: &str = "access-control-allow-methods";
const ALLOW_HEADERS: &str = "access-control-allow-headers";
const REQUEST_METHOD: &str = "access-control-request-method";

/// Cross-origin resource sharing middleware.
pub struct CorsStage {
    /// Empty means any origin.
    origins: HashSet<String>,
}

impl CorsStage {
    /// Creates the stage from the configured origin list. An empty list
    /// allows any origin.
    #[must_use]
    pub fn new(origins: &[String]) -> Self {
        Self {
            origins: origins.iter().cloned().collect(),
        }
    }

    fn origin_header(&self, request: &Request) -> Option<HeaderValue> {
        let origin = request
            .headers()
            .get(http::header::ORIGIN)?
            .to_str()
            .ok()?;
        if self.origins.is_empty() {
            return Some(HeaderValue::from_static("*"));
        }
        if self.origins.contains(origin) {
            return HeaderValue::from_str(origin).ok();
        }
        None
    }

    fn is_preflight(request: &Request) -> bool {
        request.method() == Method::OPTIONS && request.headers().contains_key(REQUEST_METHOD)
    }
}

impl Middleware for CorsStage {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        Box::pin(async move {
            let allowed = self.origin_header(&request);

            if Self::is_preflight(&request) {
                let mut builder = http::Response::builder().status(StatusCode::NO_CONTENT);
                if let Some(origin) = allowed {
                    builder = builder
                        .header(ALLOW_ORIGIN, origin)
                        .header(ALLOW_METHODS, "GET, POST, PUT, PATCH, DELETE")
                        .header(ALLOW_HEADERS, "content-type, x-requested-with");
                }
                return Ok(builder
                    .body(http_body_util::Full::new(bytes::Bytes::new()))
                    .map_err(|e| {
                        portico_core::PorticoError::internal(format!(
                            "cannot build preflight response: {e}"
                        ))
                    })?);
            }

            let mut response = next.run(ctx, request).await?;
            if let Some(origin) = allowed {
                response.headers_mut().insert(ALLOW_ORIGIN, origin);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Response as HttpResponse;
    use http_body_util::Full;
    use portico_pipeline::Handler;
    use std::sync::Arc;

    struct OkHandler;

    impl Handler for OkHandler {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut RequestContext,
            _request: Request,
        ) -> BoxFuture<'a, PorticoResult<Response>> {
            Box::pin(async {
                Ok(HttpResponse::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::new()))
                    .expect("response"))
            })
        }
    }

    async fn run(stage: &CorsStage, request: Request) -> Response {
        let mut ctx = RequestContext::new();
        let next = Next::new(stage, Next::handler(Arc::new(OkHandler)));
        next.run(&mut ctx, request).await.unwrap()
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let stage = CorsStage::new(&[]);
        let request = http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/widgets")
            .header(http::header::ORIGIN, "https://app.example.com")
            .header(REQUEST_METHOD, "POST")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = run(&stage, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get(ALLOW_ORIGIN).unwrap(), "*");
    }

    #[tokio::test]
    async fn test_listed_origin_is_echoed() {
        let stage = CorsStage::new(&["https://app.example.com".to_string()]);
        let request = http::Request::builder()
            .uri("/x")
            .header(http::header::ORIGIN, "https://app.example.com")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = run(&stage, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_header() {
        let stage = CorsStage::new(&["https://app.example.com".to_string()]);
        let request = http::Request::builder()
            .uri("/x")
            .header(http::header::ORIGIN, "https://evil.example.com")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = run(&stage, request).await;
        assert!(response.headers().get(ALLOW_ORIGIN).is_none());
    }
}
