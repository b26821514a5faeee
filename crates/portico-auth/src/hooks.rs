//! User-supplied hook contracts.
//!
//! Every hook that may perform I/O returns a boxed future. There is no
//! runtime sync-vs-async detection: a hook that computes its result
//! synchronously wraps it in an already-ready future. This keeps the
//! contract uniform even when a hook legitimately resolves `None`.

use portico_core::{BoxFuture, Principal, PorticoResult, Request, RequestHead};
use regex::Regex;
use std::sync::Arc;

/// Verifies credentials against the application's user store.
///
/// Resolving `Ok(None)` means the credentials were wrong — a normal
/// outcome, not an error. Resolving `Err` propagates to the pipeline's
/// terminal error handler.
pub type AuthenticateHook = Arc<
    dyn Fn(String, String, RequestHead) -> BoxFuture<'static, PorticoResult<Option<Principal>>>
        + Send
        + Sync,
>;

/// Re-hydrates a principal from its stable identifier, once per request
/// carrying a valid session.
pub type SubscribeHook =
    Arc<dyn Fn(String) -> BoxFuture<'static, PorticoResult<Principal>> + Send + Sync>;

/// Classifies a caller as programmatic (`true`) or interactive (`false`).
pub type CallerKindPredicate = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Where an unauthenticated interactive caller is sent.
#[derive(Clone)]
pub enum FailureRedirect {
    /// A fixed path.
    Path(String),
    /// Computed per request.
    Compute(Arc<dyn Fn(&Request) -> String + Send + Sync>),
}

impl FailureRedirect {
    /// Resolves the redirect target for a request.
    #[must_use]
    pub fn resolve(&self, request: &Request) -> String {
        match self {
            Self::Path(path) => path.clone(),
            Self::Compute(f) => f(request),
        }
    }
}

impl std::fmt::Debug for FailureRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Compute(_) => f.debug_tuple("Compute").field(&"<fn>").finish(),
        }
    }
}

/// The default caller-kind predicate: XHR-style requests and callers
/// preferring JSON are programmatic.
#[must_use]
pub fn default_caller_kind(request: &Request) -> bool {
    let xhr = request
        .headers()
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"));

    let wants_json = request
        .headers()
        .get(http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    xhr || wants_json
}

/// Runtime half of the auth configuration: hooks, the dynamic failure
/// redirect, the caller-kind predicate, and pattern allow-list entries.
///
/// # Example
///
/// ```
/// use portico_auth::AuthHooks;
/// use portico_core::Principal;
///
/// let hooks = AuthHooks::new()
///     .authenticate(|user, pass, _head| {
///         Box::pin(async move {
///             if user == "admin" && pass == "secret" {
///                 Ok(Some(Principal::new(1)))
///             } else {
///                 Ok(None)
///             }
///         })
///     })
///     .subscribe(|id| Box::pin(async move { Ok(Principal::new(id)) }));
/// ```
#[derive(Clone, Default)]
pub struct AuthHooks {
    authenticate: Option<AuthenticateHook>,
    subscribe: Option<SubscribeHook>,
    caller_kind: Option<CallerKindPredicate>,
    failure_redirect: Option<FailureRedirect>,
    allow_patterns: Vec<Regex>,
}

impl AuthHooks {
    /// Creates an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the credential-verification hook.
    #[must_use]
    pub fn authenticate<F>(mut self, hook: F) -> Self
    where
        F: Fn(String, String, RequestHead) -> BoxFuture<'static, PorticoResult<Option<Principal>>>
            + Send
            + Sync
            + 'static,
    {
        self.authenticate = Some(Arc::new(hook));
        self
    }

    /// Sets the principal re-hydration hook.
    #[must_use]
    pub fn subscribe<F>(mut self, hook: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, PorticoResult<Principal>> + Send + Sync + 'static,
    {
        self.subscribe = Some(Arc::new(hook));
        self
    }

    /// Overrides the programmatic-vs-interactive predicate.
    #[must_use]
    pub fn caller_kind<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.caller_kind = Some(Arc::new(predicate));
        self
    }

    /// Sets a dynamic failure-redirect target, taking precedence over the
    /// path configured in the auth document.
    #[must_use]
    pub fn failure_redirect<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.failure_redirect = Some(FailureRedirect::Compute(Arc::new(f)));
        self
    }

    /// Adds a pattern allow-list entry, evaluated after the literal
    /// entries from the auth document.
    #[must_use]
    pub fn allow_pattern(mut self, pattern: Regex) -> Self {
        self.allow_patterns.push(pattern);
        self
    }

    /// The credential-verification hook, if set.
    #[must_use]
    pub fn authenticate_hook(&self) -> Option<&AuthenticateHook> {
        self.authenticate.as_ref()
    }

    /// The re-hydration hook, if set.
    #[must_use]
    pub fn subscribe_hook(&self) -> Option<&SubscribeHook> {
        self.subscribe.as_ref()
    }

    /// The caller-kind predicate, if overridden.
    #[must_use]
    pub fn caller_kind_predicate(&self) -> Option<&CallerKindPredicate> {
        self.caller_kind.as_ref()
    }

    /// The dynamic failure redirect, if set.
    #[must_use]
    pub fn failure_redirect_target(&self) -> Option<&FailureRedirect> {
        self.failure_redirect.as_ref()
    }

    /// Pattern allow-list entries.
    #[must_use]
    pub fn allow_patterns(&self) -> &[Regex] {
        &self.allow_patterns
    }
}

impl std::fmt::Debug for AuthHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHooks")
            .field("authenticate", &self.authenticate.is_some())
            .field("subscribe", &self.subscribe.is_some())
            .field("caller_kind", &self.caller_kind.is_some())
            .field("failure_redirect", &self.failure_redirect)
            .field("allow_patterns", &self.allow_patterns.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;

    fn request_with_header(name: &str, value: &str) -> Request {
        http::Request::builder()
            .uri("/x")
            .header(name, value)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn test_default_caller_kind_xhr() {
        let req = request_with_header("x-requested-with", "XMLHttpRequest");
        assert!(default_caller_kind(&req));
    }

    #[test]
    fn test_default_caller_kind_json_accept() {
        let req = request_with_header("accept", "application/json");
        assert!(default_caller_kind(&req));
    }

    #[test]
    fn test_default_caller_kind_browser() {
        let req = request_with_header("accept", "text/html,application/xhtml+xml");
        assert!(!default_caller_kind(&req));
    }

    #[tokio::test]
    async fn test_sync_hook_wraps_ready_future() {
        // A hook with no awaits still satisfies the boxed-future contract.
        let hooks = AuthHooks::new().subscribe(|id| {
            let principal = Principal::new(id);
            Box::pin(std::future::ready(Ok(principal)))
        });

        let hook = hooks.subscribe_hook().unwrap();
        let principal = hook("7".to_string()).await.unwrap();
        assert_eq!(principal.id_string().as_deref(), Some("7"));
    }

    #[test]
    fn test_failure_redirect_resolution() {
        let fixed = FailureRedirect::Path("/login".to_string());
        let req = request_with_header("accept", "text/html");
        assert_eq!(fixed.resolve(&req), "/login");

        let dynamic = FailureRedirect::Compute(Arc::new(|req: &Request| {
            format!("/login?from={}", req.uri().path())
        }));
        assert_eq!(dynamic.resolve(&req), "/login?from=/x");
    }
}
