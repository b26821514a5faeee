//! Per-request context.
//!
//! A [`RequestContext`] accompanies each request through the middleware
//! chain. Stages enrich it as the request proceeds: the ingest stage
//! stores parsed cookies, the locals stage computes render variables, the
//! auth gate attaches the principal, the multipart stage stores parsed
//! form fields. Handlers receive it alongside the request.

use crate::principal::Principal;
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// Context that flows through the middleware chain with one request.
///
/// # Example
///
/// ```
/// use portico_core::{Principal, RequestContext};
///
/// let mut ctx = RequestContext::new();
/// ctx.set_principal(Principal::new(42));
/// assert!(ctx.principal().is_some());
/// ```
#[derive(Debug)]
pub struct RequestContext {
    /// Unique identifier for this request (UUID v7).
    request_id: Uuid,

    /// The authenticated principal, once the auth gate re-hydrates it.
    principal: Option<Principal>,

    /// Render-time variables exposed to the template engine.
    locals: Map<String, Value>,

    /// When the request started processing.
    started_at: Instant,

    /// Type-erased extension data, keyed by type.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            principal: None,
            locals: Map::new(),
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the authenticated principal, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Attaches the authenticated principal.
    ///
    /// Called by the auth gate after the subscribe hook resolves; the
    /// principal itself is never mutated afterwards.
    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    /// Returns the render locals.
    #[must_use]
    pub fn locals(&self) -> &Map<String, Value> {
        &self.locals
    }

    /// Sets a render local.
    pub fn set_local(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.locals.insert(name.into(), value.into());
    }

    /// Returns a render local by name.
    #[must_use]
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    ///
    /// Extensions let a stage stash data (parsed cookies, form fields)
    /// that later stages or the handler retrieve by type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks whether an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
