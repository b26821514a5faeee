//! Pipeline assembly.
//!
//! [`Assembler::mount`] sequences the ten mount steps in their mandatory
//! order: three startup effects (globals, environment, models), six
//! request-time stages, and the terminal fallback. The order is an
//! invariant; [`App::stage_names`](crate::App::stage_names) exposes it so
//! tests can assert it structurally.

use crate::app::App;
use crate::collab::{DotenvLoader, EnvLoader, ModelRegistry, NotFoundFallback, Renderer};
use crate::cors::CorsStage;
use crate::locals::LocalsStage;
use crate::logging::IngestStage;
use crate::views::ViewsStage;
use portico_auth::{AuthGate, AuthHooks, MemorySessionStore, SessionStore};
use portico_config::{PorticoConfig, SessionStoreKind};
use portico_core::{PorticoError, PorticoResult};
use portico_pipeline::{Handler, Pipeline, Stage};
use portico_routes::{HandlerRegistry, MultipartStage, RouteTable, UploadResolver};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cross-mount process state.
///
/// The environment file must load at most once per process even when
/// several pipelines mount; assemblers sharing an `InitState` share that
/// guarantee.
#[derive(Debug, Default)]
pub struct InitState {
    env_loaded: AtomicBool,
}

impl InitState {
    /// Creates a fresh state.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True once the environment file has been loaded through this state.
    #[must_use]
    pub fn env_loaded(&self) -> bool {
        self.env_loaded.load(Ordering::SeqCst)
    }

    fn try_mark_env_loaded(&self) -> bool {
        !self.env_loaded.swap(true, Ordering::SeqCst)
    }
}

/// Builds an [`App`] from configuration plus the application-supplied
/// collaborators.
///
/// # Example
///
/// ```no_run
/// use portico::{Assembler, HandlerRegistry};
/// use portico_config::ConfigResolver;
///
/// # async fn demo() -> portico_core::PorticoResult<()> {
/// let config = ConfigResolver::new("config").load()?;
/// let app = Assembler::new(config)
///     .routes(HandlerRegistry::new())
///     .mount()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Assembler {
    config: PorticoConfig,
    registry: HandlerRegistry,
    hooks: AuthHooks,
    models: Vec<Arc<dyn ModelRegistry>>,
    renderer: Option<Arc<dyn Renderer>>,
    env_loader: Arc<dyn EnvLoader>,
    session_store: Option<Arc<dyn SessionStore>>,
    upload_resolver: Option<UploadResolver>,
    fallback: Arc<dyn Handler>,
    init: Arc<InitState>,
}

impl Assembler {
    /// Creates an assembler with default collaborators: the dotenv
    /// loader, the 404 fallback, and a fresh init state.
    #[must_use]
    pub fn new(config: PorticoConfig) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
            hooks: AuthHooks::new(),
            models: Vec::new(),
            renderer: None,
            env_loader: Arc::new(DotenvLoader),
            session_store: None,
            upload_resolver: None,
            fallback: Arc::new(NotFoundFallback),
            init: InitState::new(),
        }
    }

    /// Sets the route handler registry.
    #[must_use]
    pub fn routes(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the authentication hooks. Required when auth is enabled.
    #[must_use]
    pub fn auth_hooks(mut self, hooks: AuthHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Adds a model registry, sequenced at mount step 3.
    #[must_use]
    pub fn model_registry(mut self, registry: Arc<dyn ModelRegistry>) -> Self {
        self.models.push(registry);
        self
    }

    /// Sets the template engine bound at mount step 5.
    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Overrides the environment-file loader.
    #[must_use]
    pub fn env_loader(mut self, loader: Arc<dyn EnvLoader>) -> Self {
        self.env_loader = loader;
        self
    }

    /// Supplies the session store backing an `external` store kind.
    /// Ignored for the in-memory kind.
    #[must_use]
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Sets the per-request upload handler resolver.
    #[must_use]
    pub fn upload_resolver(mut self, resolver: UploadResolver) -> Self {
        self.upload_resolver = Some(resolver);
        self
    }

    /// Overrides the terminal fallback handler.
    #[must_use]
    pub fn fallback(mut self, handler: Arc<dyn Handler>) -> Self {
        self.fallback = handler;
        self
    }

    /// Shares an init state across assemblers, so the environment file
    /// loads at most once per process.
    #[must_use]
    pub fn init_state(mut self, init: Arc<InitState>) -> Self {
        self.init = init;
        self
    }

    /// Runs the ten mount steps and returns the assembled app.
    ///
    /// # Errors
    ///
    /// Fails when the environment file is unreadable, a model registry
    /// fails, the auth gate is misconfigured, or the route scan fails.
    pub async fn mount(self) -> PorticoResult<App> {
        let mut installed = Vec::new();
        let mut pipeline = Pipeline::new();

        // Step 1: globals.
        let root = PathBuf::from(&self.config.app.root_path);
        tracing::info!(root = %root.display(), "mounting pipeline");
        installed.push(Stage::Globals);

        // Step 2: environment, once per init state.
        if let Some(env_file) = &self.config.app.env_file {
            if self.init.try_mark_env_loaded() {
                self.env_loader.load(&root.join(env_file))?;
            } else {
                tracing::debug!("environment already loaded, skipping");
            }
        }
        installed.push(Stage::Environment);

        // Step 3: models. Every registry initializes before any
        // registry associates.
        for registry in &self.models {
            registry.initialize()?;
        }
        for registry in &self.models {
            registry.associate()?;
        }
        installed.push(Stage::Models);

        // Step 4: ingest.
        pipeline.push(IngestStage::new(self.config.logging.access_log));
        installed.push(Stage::Ingest);

        // Step 5: views. Installed even without a renderer, so the
        // stage order never depends on configuration.
        pipeline.push(ViewsStage::new(self.renderer.clone()));
        installed.push(Stage::Views);

        // Step 6: CORS, only when enabled.
        if self.config.app.cors_enabled {
            pipeline.push(CorsStage::new(&self.config.app.cors_origins));
            installed.push(Stage::Cors);
        }

        // Step 7: locals.
        pipeline.push(LocalsStage);
        installed.push(Stage::Locals);

        // Step 8: the auth gate, only when enabled.
        let mut gate = None;
        if self.config.auth.enabled {
            let store = self.resolve_session_store()?;
            let built = Arc::new(AuthGate::new(
                self.config.auth.clone(),
                self.hooks.clone(),
                store,
            )?);
            pipeline.push_boxed(built.clone());
            gate = Some(built);
            installed.push(Stage::AuthGate);
        }

        // Step 9: routes, with the multipart stage ahead of every
        // handler.
        let multipart = match &self.upload_resolver {
            Some(resolver) => {
                MultipartStage::with_resolver(self.config.upload, resolver.clone())
            }
            None => MultipartStage::new(self.config.upload),
        };
        let table = RouteTable::scan(
            &root.join(&self.config.app.routes_dir),
            &self.registry,
            self.config.app.default_route.as_deref(),
            multipart,
        )?;
        pipeline.push(table);
        installed.push(Stage::Routes);

        // Step 10: the terminal fallback. Error rendering uses the same
        // caller-kind predicate as the gate.
        installed.push(Stage::Fallback);
        let caller_kind = self.hooks.caller_kind_predicate().cloned();

        Ok(App::new(pipeline, self.fallback, gate, caller_kind, installed))
    }

    fn resolve_session_store(&self) -> PorticoResult<Arc<dyn SessionStore>> {
        match self.config.auth.session_store {
            SessionStoreKind::Memory => Ok(Arc::new(MemorySessionStore::new(
                Duration::from_millis(self.config.auth.session_expiration_ms),
            ))),
            SessionStoreKind::External => self.session_store.clone().ok_or_else(|| {
                PorticoError::configuration(
                    "session_store is external but no store was supplied to the assembler",
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_state_env_loads_once() {
        let init = InitState::new();
        assert!(init.try_mark_env_loaded());
        assert!(!init.try_mark_env_loaded());
        assert!(init.env_loaded());
    }
}
