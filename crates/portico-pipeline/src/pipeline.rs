//! Ordered, immutable middleware pipeline.
//!
//! The assembler installs stages in a fixed sequence; once built, the
//! pipeline cannot be reordered. [`Stage`] names every step of the
//! assembly — including the three startup effects that precede the
//! request stages — so tests can assert the complete order structurally
//! rather than behaviorally.

use crate::middleware::{Handler, Middleware, Next};
use portico_core::{PorticoResult, Request, RequestContext, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in the pipeline.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The assembly steps, in their mandatory order.
///
/// Steps 1–3 are startup side effects sequenced by the assembler before
/// any request is accepted; steps 4–10 install request-time stages.
/// Swapping any two steps breaks an invariant: routes need parsed bodies
/// and sessions, the auth gate needs parsed cookies, the fallback must be
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Step 1: process-wide globals (application root path).
    Globals = 1,
    /// Step 2: environment-file loading, guarded by the init state.
    Environment = 2,
    /// Step 3: persistence model registration (initialize, then associate).
    Models = 3,
    /// Step 4: body/cookie parsing and access logging.
    Ingest = 4,
    /// Step 5: template-engine binding.
    Views = 5,
    /// Step 6: CORS header injection (conditional).
    Cors = 6,
    /// Step 7: render-locals injection (base URL, current path).
    Locals = 7,
    /// Step 8: session-backed authentication gate.
    AuthGate = 8,
    /// Step 9: route-table dispatch.
    Routes = 9,
    /// Step 10: terminal 404/error fallback.
    Fallback = 10,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Globals => "globals",
            Self::Environment => "environment",
            Self::Models => "models",
            Self::Ingest => "ingest",
            Self::Views => "views",
            Self::Cors => "cors",
            Self::Locals => "locals",
            Self::AuthGate => "auth_gate",
            Self::Routes => "routes",
            Self::Fallback => "fallback",
        }
    }

    /// True if this step runs per-request (steps 4–9 install middleware,
    /// step 10 installs the terminal handler).
    #[must_use]
    pub const fn is_request_stage(self) -> bool {
        (self as u8) >= 4
    }

    /// Returns all steps in order.
    #[must_use]
    pub const fn all() -> [Stage; 10] {
        [
            Self::Globals,
            Self::Environment,
            Self::Models,
            Self::Ingest,
            Self::Views,
            Self::Cors,
            Self::Locals,
            Self::AuthGate,
            Self::Routes,
            Self::Fallback,
        ]
    }
}

/// The ordered middleware pipeline.
///
/// Stages run in installation order; the terminal handler (the fallback)
/// runs when no stage short-circuits. Immutable once built.
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage. Installation order is execution order.
    pub fn push<M: Middleware>(&mut self, middleware: M) {
        self.stages.push(Arc::new(middleware));
    }

    /// Appends an already-boxed stage.
    pub fn push_boxed(&mut self, middleware: BoxedMiddleware) {
        self.stages.push(middleware);
    }

    /// Processes a request through every stage, then the terminal handler.
    pub async fn process(
        &self,
        ctx: &mut RequestContext,
        request: Request,
        handler: Arc<dyn Handler>,
    ) -> PorticoResult<Response> {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next.run(ctx, request).await
    }

    /// Returns the names of all installed stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of installed stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if no stages are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
