//! Template-engine binding stage.

use crate::collab::Renderer;
use portico_core::{BoxFuture, PorticoResult, Request, RequestContext, Response};
use portico_pipeline::{Middleware, Next};
use std::sync::Arc;

/// A shared handle to the bound template engine, stored as a context
/// extension so route handlers can render views.
#[derive(Clone)]
pub struct ViewEngine(pub Arc<dyn Renderer>);

/// Binds the configured renderer into every request context.
///
/// Installed unconditionally so the stage order is stable; without a
/// renderer it is a pass-through.
pub struct ViewsStage {
    renderer: Option<Arc<dyn Renderer>>,
}

impl ViewsStage {
    /// Creates the stage with an optional renderer.
    #[must_use]
    pub fn new(renderer: Option<Arc<dyn Renderer>>) -> Self {
        Self { renderer }
    }
}

impl Middleware for ViewsStage {
    fn name(&self) -> &'static str {
        "views"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        Box::pin(async move {
            if let Some(renderer) = &self.renderer {
                ctx.set_extension(ViewEngine(renderer.clone()));
            }
            next.run(ctx, request).await
        })
    }
}
