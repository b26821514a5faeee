//! The assembled application.

use portico_auth::hooks::{default_caller_kind, CallerKindPredicate};
use portico_auth::AuthGate;
use portico_core::{PorticoError, Request, RequestContext, Response, ResponseExt};
use portico_pipeline::{Handler, Pipeline, Stage};
use std::sync::Arc;

/// A mounted pipeline, ready to serve requests.
///
/// Produced by [`Assembler::mount`](crate::Assembler::mount); immutable
/// afterwards. The host HTTP server calls [`handle`](App::handle) once
/// per request.
pub struct App {
    pipeline: Pipeline,
    fallback: Arc<dyn Handler>,
    gate: Option<Arc<AuthGate>>,
    caller_kind: Option<CallerKindPredicate>,
    installed: Vec<Stage>,
}

impl App {
    pub(crate) fn new(
        pipeline: Pipeline,
        fallback: Arc<dyn Handler>,
        gate: Option<Arc<AuthGate>>,
        caller_kind: Option<CallerKindPredicate>,
        installed: Vec<Stage>,
    ) -> Self {
        Self {
            pipeline,
            fallback,
            gate,
            caller_kind,
            installed,
        }
    }

    /// The names of every mount step taken, startup effects included, in
    /// order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.installed.iter().map(|s| s.name()).collect()
    }

    /// The names of the installed request-time stages, in execution
    /// order.
    #[must_use]
    pub fn pipeline_stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }

    /// The auth gate, when authentication is enabled. Route handlers use
    /// it for the explicit login and logout actions.
    #[must_use]
    pub fn auth(&self) -> Option<&Arc<AuthGate>> {
        self.gate.as_ref()
    }

    /// Runs one request through the pipeline.
    ///
    /// Never fails: a stage or hook error is rendered as an error
    /// response — JSON for programmatic callers, plain text otherwise.
    /// Caller kind comes from the same predicate the auth gate consults.
    pub async fn handle(&self, request: Request) -> Response {
        let programmatic = match &self.caller_kind {
            Some(predicate) => predicate(&request),
            None => default_caller_kind(&request),
        };
        let mut ctx = RequestContext::new();

        match self
            .pipeline
            .process(&mut ctx, request, self.fallback.clone())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    request_id = %ctx.request_id(),
                    "request pipeline failed"
                );
                render_error(programmatic, &err)
            }
        }
    }
}

fn render_error(programmatic: bool, err: &PorticoError) -> Response {
    let status = err.status_code();
    if programmatic {
        Response::json_error(status, err.code(), &err.to_string())
    } else {
        Response::error(status, &err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use portico_core::{BoxFuture, PorticoResult};

    struct FailingFallback;

    impl Handler for FailingFallback {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut RequestContext,
            _request: Request,
        ) -> BoxFuture<'a, PorticoResult<Response>> {
            Box::pin(async { Err(PorticoError::hook_message("storage offline")) })
        }
    }

    fn app_with_failing_fallback() -> App {
        App::new(
            Pipeline::new(),
            Arc::new(FailingFallback),
            None,
            None,
            vec![Stage::Fallback],
        )
    }

    #[tokio::test]
    async fn test_error_renders_json_for_programmatic_callers() {
        let app = app_with_failing_fallback();
        let request = http::Request::builder()
            .uri("/x")
            .header("accept", "application/json")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = app.handle(request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_error_renders_text_for_interactive_callers() {
        let app = app_with_failing_fallback();
        let request = http::Request::builder()
            .uri("/x")
            .header("accept", "text/html")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = app.handle(request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_error_rendering_honors_custom_caller_kind_predicate() {
        let predicate: CallerKindPredicate =
            Arc::new(|req: &Request| req.headers().contains_key("x-cli"));
        let app = App::new(
            Pipeline::new(),
            Arc::new(FailingFallback),
            None,
            Some(predicate),
            vec![Stage::Fallback],
        );

        // The default predicate would call this interactive; the custom
        // one classifies it programmatic, so the error is JSON.
        let request = http::Request::builder()
            .uri("/x")
            .header("x-cli", "1")
            .header("accept", "text/html")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = app.handle(request).await;
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
