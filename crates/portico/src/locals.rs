//! Render-locals injection.
//!
//! Sets the locals templates rely on everywhere: the externally-visible
//! base URL and the current request path. A malformed or missing `Host`
//! header degrades to partial locals; it never fails the request.

use portico_core::{BoxFuture, PorticoResult, Request, RequestContext, Response};
use portico_pipeline::{Middleware, Next};

/// Injects `base_url` and `current_path` into the render locals.
pub struct LocalsStage;

fn base_url(request: &Request) -> Option<String> {
    let host = request
        .headers()
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())?;
    if host.is_empty() {
        return None;
    }

    let scheme = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().scheme_str())
        .unwrap_or("http");

    Some(format!("{scheme}://{host}"))
}

impl Middleware for LocalsStage {
    fn name(&self) -> &'static str {
        "locals"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        Box::pin(async move {
            if let Some(url) = base_url(&request) {
                ctx.set_local("base_url", url);
            }
            ctx.set_local("current_path", request.uri().path());
            next.run(ctx, request).await
        })
    }
}
