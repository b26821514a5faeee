//! The per-request authentication gate.
//!
//! Decision order, per request:
//!
//! 1. allow-list match → pass, no auth work at all;
//! 2. valid session → re-hydrate the principal, then either bounce an
//!    interactive caller off the login page to the success target, or
//!    bind the principal into the render locals and pass;
//! 3. no session → `401` for programmatic callers; pass if the caller is
//!    already on the failure-redirect path (the login page must stay
//!    reachable); otherwise redirect to the failure target.
//!
//! The failure target is compared with its query string stripped, so
//! `/login?from=/x` and a request for `/login` are the same page.

use crate::allow::{normalize_path, AllowList};
use crate::hooks::{
    default_caller_kind, AuthHooks, AuthenticateHook, CallerKindPredicate, FailureRedirect,
    SubscribeHook,
};
use crate::session::{self, SessionStore};
use portico_config::AuthSettings;
use portico_core::{
    BoxFuture, Cookies, FormFields, PorticoError, PorticoResult, Request, RequestContext,
    RequestHead, Response, ResponseExt, SetCookie,
};
use portico_pipeline::{Middleware, Next};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Session-backed authentication gate.
///
/// Installed by the assembler when authentication is enabled; also
/// exposes the explicit [`login`](AuthGate::login) and
/// [`logout`](AuthGate::logout) actions that route handlers invoke.
pub struct AuthGate {
    settings: AuthSettings,
    authenticate: AuthenticateHook,
    subscribe: SubscribeHook,
    caller_kind: Option<CallerKindPredicate>,
    failure_redirect: FailureRedirect,
    allow: AllowList,
    store: Arc<dyn SessionStore>,
    plaintext_warned: AtomicBool,
}

impl AuthGate {
    /// Builds the gate from the auth document, the runtime hooks, and a
    /// session store.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when authentication is enabled but
    /// the authenticate or subscribe hook is missing. Checked at mount
    /// time, before any request is served.
    pub fn new(
        settings: AuthSettings,
        hooks: AuthHooks,
        store: Arc<dyn SessionStore>,
    ) -> PorticoResult<Self> {
        let authenticate = hooks.authenticate_hook().cloned().ok_or_else(|| {
            PorticoError::configuration("auth is enabled but no authenticate hook is configured")
        })?;
        let subscribe = hooks.subscribe_hook().cloned().ok_or_else(|| {
            PorticoError::configuration("auth is enabled but no subscribe hook is configured")
        })?;

        let mut allow = AllowList::from_literals(&settings.allow_unauthenticated);
        for pattern in hooks.allow_patterns() {
            allow.push_pattern(pattern.clone());
        }

        // The dynamic target takes precedence; otherwise the path from
        // the auth document becomes a fixed target.
        let failure_redirect = hooks
            .failure_redirect_target()
            .cloned()
            .unwrap_or_else(|| FailureRedirect::Path(settings.failure_redirect.clone()));

        Ok(Self {
            settings,
            authenticate,
            subscribe,
            caller_kind: hooks.caller_kind_predicate().cloned(),
            failure_redirect,
            allow,
            store,
            plaintext_warned: AtomicBool::new(false),
        })
    }

    /// Verifies credentials through the authenticate hook.
    ///
    /// Resolves `Ok(None)` on wrong credentials: no session is created
    /// and no cookie is issued. On success, a session binding the
    /// principal's stable identifier is created and the session cookie
    /// to set is returned. Hook failures propagate.
    pub async fn login(
        &self,
        request: &Request,
        user: &str,
        pass: &str,
    ) -> PorticoResult<Option<SetCookie>> {
        let head = RequestHead::of(request);
        let principal =
            (self.authenticate)(user.to_string(), pass.to_string(), head).await?;

        let Some(principal) = principal else {
            tracing::debug!(user, "login rejected: wrong credentials");
            return Ok(None);
        };

        let id = principal.id_string().ok_or_else(|| {
            PorticoError::authentication("authenticated principal is missing a stable id")
        })?;

        let token = session::new_token();
        self.store.insert(&token, &id).await;
        tracing::info!(principal_id = %id, "session created");

        Ok(Some(self.session_cookie(&token)))
    }

    /// Extracts login credentials from parsed form fields, using the
    /// configured field names.
    #[must_use]
    pub fn credentials(&self, fields: &FormFields) -> Option<(String, String)> {
        let user = fields.get(&self.settings.user_field)?;
        let pass = fields.get(&self.settings.pass_field)?;
        Some((user.to_string(), pass.to_string()))
    }

    /// Destroys the caller's session binding.
    ///
    /// Returns the removal cookie to set. Does not redirect; the caller
    /// decides post-logout routing.
    pub async fn logout(&self, request: &Request) -> SetCookie {
        let cookies = Cookies::from_headers(request.headers());
        if let Some(token) = cookies.get(&self.settings.cookie_name) {
            self.store.remove(token).await;
        }
        SetCookie::removal(&self.settings.cookie_name)
    }

    /// The session store backing this gate.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    fn session_cookie(&self, token: &str) -> SetCookie {
        SetCookie::new(&self.settings.cookie_name, token)
            .http_only(self.settings.cookie_http_only)
            .secure(self.settings.cookie_secure)
            .max_age(Duration::from_millis(self.settings.session_expiration_ms))
    }

    fn is_programmatic(&self, request: &Request) -> bool {
        match &self.caller_kind {
            Some(predicate) => predicate(request),
            None => default_caller_kind(request),
        }
    }

    /// The effective failure-redirect target for this request.
    fn failure_target(&self, request: &Request) -> String {
        self.failure_redirect.resolve(request)
    }

    /// Warns once per gate when the secure-cookie flag is set but the
    /// transport is plaintext. Operational diagnostic only; the request
    /// proceeds.
    fn warn_if_plaintext(&self, request: &Request) {
        if !self.settings.cookie_secure {
            return;
        }

        let scheme = request
            .headers()
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .or_else(|| request.uri().scheme_str())
            .unwrap_or("http");

        if scheme == "http" && !self.plaintext_warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "cookie_secure is set but requests arrive over plaintext http; \
                 the session cookie will not be sent by browsers"
            );
        }
    }

    fn session_token(&self, ctx: &RequestContext, request: &Request) -> Option<String> {
        let from_ctx = ctx
            .get_extension::<Cookies>()
            .and_then(|c| c.get(&self.settings.cookie_name).map(str::to_string));
        from_ctx.or_else(|| {
            Cookies::from_headers(request.headers())
                .get(&self.settings.cookie_name)
                .map(str::to_string)
        })
    }
}

impl Middleware for AuthGate {
    fn name(&self) -> &'static str {
        "auth_gate"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        Box::pin(async move {
            if !self.settings.enabled {
                return next.run(ctx, request).await;
            }

            self.warn_if_plaintext(&request);

            let path = request.uri().path().to_string();
            if self.allow.matches(&path) {
                return next.run(ctx, request).await;
            }

            let session_id = match self.session_token(ctx, &request) {
                Some(token) => self.store.get(&token).await,
                None => None,
            };

            let target = self.failure_target(&request);
            let target_path = normalize_path(target.split('?').next().unwrap_or(&target));
            let current = normalize_path(&path);

            match session_id {
                Some(id) => {
                    // Re-hydrate before the redirect decision so the
                    // render locals carry the full principal.
                    let principal = (self.subscribe)(id).await?;

                    if current == target_path && !self.is_programmatic(&request) {
                        return Ok(Response::redirect(&self.settings.success_redirect));
                    }

                    ctx.set_local("session", principal.to_value());
                    ctx.set_principal(principal);
                    next.run(ctx, request).await
                }
                None => {
                    if self.is_programmatic(&request) {
                        return Ok(Response::unauthorized());
                    }
                    if current == target_path {
                        return next.run(ctx, request).await;
                    }
                    Ok(Response::redirect(&target))
                }
            }
        })
    }
}
