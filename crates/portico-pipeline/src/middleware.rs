//! Core middleware and handler traits.
//!
//! Middleware runs strictly sequentially within one request: each stage
//! must complete (or short-circuit with its own response) before the next
//! runs. A stage surfaces failure by returning an error, which flows down
//! the chain to the terminal fallback handler; stages never render error
//! pages themselves.

use portico_core::{BoxFuture, PorticoResult, Request, RequestContext, Response};
use std::sync::Arc;

/// A terminal request handler: the end of a chain.
///
/// Route handlers and the pipeline's fallback both implement this. The
/// handler borrows the context, so it can read locals, the principal,
/// and parsed form fields.
pub trait Handler: Send + Sync {
    /// Handles the request and produces the response.
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, PorticoResult<Response>>;
}

/// The core middleware trait.
///
/// Implementations receive the mutable request context, the request, and
/// a [`Next`] callback. Calling `next.run()` continues the chain; not
/// calling it short-circuits with this stage's own outcome.
///
/// # Example
///
/// ```ignore
/// struct NoopStage;
///
/// impl Middleware for NoopStage {
///     fn name(&self) -> &'static str {
///         "noop"
///     }
///
///     fn process<'a>(
///         &'a self,
///         ctx: &'a mut RequestContext,
///         request: Request,
///         next: Next<'a>,
///     ) -> BoxFuture<'a, PorticoResult<Response>> {
///         Box::pin(async move { next.run(ctx, request).await })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage, used for logging and the
    /// structural order assertion.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>>;
}

/// Callback invoking the rest of the chain.
///
/// Consumed on use, so a stage can continue the chain at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Arc<dyn Handler>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given middleware.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub fn handler(handler: Arc<dyn Handler>) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// Invokes the next middleware or handler in the chain.
    pub async fn run(
        self,
        ctx: &mut RequestContext,
        request: Request,
    ) -> PorticoResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                middleware.process(ctx, request, *next).await
            }
            NextInner::Handler(handler) => handler.call(ctx, request).await,
        }
    }
}

/// A middleware built from a closure returning a boxed future.
///
/// Lets simple stages be defined without a dedicated struct. The closure
/// must box its future so it can borrow the context for the stage's
/// lifetime.
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'b> Fn(
            &'b mut RequestContext,
            Request,
            Next<'b>,
        ) -> BoxFuture<'b, PorticoResult<Response>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        (self.func)(ctx, request, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    struct VisitStage {
        name: &'static str,
    }

    impl Middleware for VisitStage {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, PorticoResult<Response>> {
            Box::pin(async move {
                ctx.set_local(self.name, true);
                next.run(ctx, request).await
            })
        }
    }

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
                    .body(Full::new(Bytes::from("OK")))
                    .expect("response"))
            })
        }
    }

    struct FailingHandler;

    impl Handler for FailingHandler {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut RequestContext,
            _request: Request,
        ) -> BoxFuture<'a, PorticoResult<Response>> {
            Box::pin(async { Err(portico_core::PorticoError::hook_message("boom")) })
        }
    }

    fn test_request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let first = VisitStage { name: "first" };
        let second = VisitStage { name: "second" };

        let mut ctx = RequestContext::new();
        let terminal = Next::handler(Arc::new(OkHandler));
        let next = Next::new(&first, Next::new(&second, terminal));

        let response = next.run(&mut ctx, test_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.local("first").unwrap(), true);
        assert_eq!(ctx.local("second").unwrap(), true);
    }

    #[tokio::test]
    async fn test_error_propagates_through_chain() {
        let stage = VisitStage { name: "outer" };

        let mut ctx = RequestContext::new();
        let next = Next::new(&stage, Next::handler(Arc::new(FailingHandler)));
        let result = next.run(&mut ctx, test_request()).await;

        assert!(result.is_err());
        // The outer stage still ran before the failure.
        assert_eq!(ctx.local("outer").unwrap(), true);
    }

    #[tokio::test]
    async fn test_fn_middleware() {
        fn coerce<F>(func: F) -> F
        where
            F: for<'b> Fn(
                &'b mut RequestContext,
                Request,
                Next<'b>,
            ) -> BoxFuture<'b, PorticoResult<Response>>,
        {
            func
        }

        let stage = FnMiddleware::new(
            "fn_stage",
            coerce(|ctx, req, next| {
                Box::pin(async move {
                    ctx.set_local("fn_stage", true);
                    next.run(ctx, req).await
                })
            }),
        );
        assert_eq!(stage.name(), "fn_stage");

        let mut ctx = RequestContext::new();
        let next = Next::new(&stage, Next::handler(Arc::new(OkHandler)));
        let response = next.run(&mut ctx, test_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.local("fn_stage").unwrap(), true);
    }
}
