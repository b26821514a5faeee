//! Tracing setup and the ingest stage.
//!
//! The ingest stage is the first request-time stage: it parses cookies
//! into the context and, when enabled, emits one access-log line per
//! request with the response status and elapsed time.

use portico_config::{LogFormat, LoggingSettings};
use portico_core::{BoxFuture, Cookies, PorticoResult, Request, RequestContext, Response};
use portico_pipeline::{Middleware, Next};
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber from the logging document.
///
/// `RUST_LOG` overrides the configured level. Safe to call more than
/// once; later calls are no-ops.
pub fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}

/// Request ingest: cookie parsing plus the access log.
pub struct IngestStage {
    access_log: bool,
}

impl IngestStage {
    /// Creates the stage; `access_log` controls the per-request line.
    #[must_use]
    pub fn new(access_log: bool) -> Self {
        Self { access_log }
    }
}

impl Middleware for IngestStage {
    fn name(&self) -> &'static str {
        "ingest"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        Box::pin(async move {
            ctx.set_extension(Cookies::from_headers(request.headers()));

            let method = request.method().clone();
            let path = request.uri().path().to_string();

            let result = next.run(ctx, request).await;

            if self.access_log {
                match &result {
                    Ok(response) => tracing::info!(
                        %method,
                        %path,
                        status = response.status().as_u16(),
                        elapsed_ms = ctx.elapsed().as_millis() as u64,
                        request_id = %ctx.request_id(),
                        "request"
                    ),
                    Err(err) => tracing::warn!(
                        %method,
                        %path,
                        error = %err,
                        elapsed_ms = ctx.elapsed().as_millis() as u64,
                        request_id = %ctx.request_id(),
                        "request failed"
                    ),
                }
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Response as HttpResponse, StatusCode};
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

    #[tokio::test]
    async fn test_ingest_parses_cookies_into_context() {
        let stage = IngestStage::new(false);
        let mut ctx = RequestContext::new();

        let request = http::Request::builder()
            .uri("/x")
            .header(http::header::COOKIE, "portico.sid=tok123; theme=dark")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let next = Next::new(&stage, Next::handler(Arc::new(OkHandler)));
        next.run(&mut ctx, request).await.unwrap();

        let cookies = ctx.get_extension::<Cookies>().unwrap();
        assert_eq!(cookies.get("portico.sid"), Some("tok123"));
        assert_eq!(cookies.get("theme"), Some("dark"));
    }

    #[tokio::test]
    async fn test_ingest_without_cookie_header() {
        let stage = IngestStage::new(true);
        let mut ctx = RequestContext::new();

        let request = http::Request::builder()
            .uri("/x")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let next = Next::new(&stage, Next::handler(Arc::new(OkHandler)));
        next.run(&mut ctx, request).await.unwrap();

        assert!(ctx.get_extension::<Cookies>().unwrap().is_empty());
    }
}
