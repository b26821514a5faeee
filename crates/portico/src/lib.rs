//! # Portico
//!
//! A session-aware request pipeline for Rust web applications:
//!
//! - **Fixed-order middleware** – ten mount steps that cannot be
//!   reordered, asserted structurally in tests
//! - **Filesystem routing** – route URLs derived from the files under
//!   the routes directory, frozen at mount time
//! - **Session auth gate** – allow-lists, principal re-hydration, and
//!   programmatic-vs-interactive failure handling
//! - **Multipart negotiation** – per-route body parsing injected ahead
//!   of every handler
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portico::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> portico_core::PorticoResult<()> {
//!     let config = ConfigResolver::new("config").load()?;
//!     init_tracing(&config.logging);
//!
//!     let mut routes = HandlerRegistry::new();
//!     routes.register("/home", HomeHandler);
//!
//!     let app = Assembler::new(config).routes(routes).mount().await?;
//!     // Hand `app` to the host HTTP server; call `app.handle(request)`
//!     // once per request.
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! Mount steps run in a mandatory order; steps 1–3 are startup effects,
//! steps 4–10 serve requests:
//!
//! ```text
//! Globals → Environment → Models │ Ingest → Views → Cors → Locals
//!                                │   → AuthGate → Routes → Fallback
//! ```

#![doc(html_root_url = "https://docs.rs/portico/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod assemble;
pub mod collab;
pub mod cors;
pub mod locals;
pub mod logging;
pub mod views;

pub use app::App;
pub use assemble::{Assembler, InitState};
pub use collab::{DotenvLoader, EnvLoader, ModelRegistry, NotFoundFallback, Renderer};
pub use cors::CorsStage;
pub use locals::LocalsStage;
pub use logging::{init_tracing, IngestStage};
pub use views::{ViewEngine, ViewsStage};

// Re-export the member crates under stable names.
pub use portico_auth as auth;
pub use portico_config as config;
pub use portico_core as core;
pub use portico_pipeline as pipeline;
pub use portico_routes as routes;

pub use portico_routes::HandlerRegistry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use portico::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::App;
    pub use crate::assemble::{Assembler, InitState};
    pub use crate::collab::{DotenvLoader, EnvLoader, ModelRegistry, Renderer};
    pub use crate::logging::init_tracing;
    pub use crate::views::ViewEngine;

    pub use portico_auth::{AuthGate, AuthHooks, MemorySessionStore, SessionStore};
    pub use portico_config::{ConfigResolver, PorticoConfig};
    pub use portico_core::{
        Cookies, FormFields, PorticoError, PorticoResult, Principal, Request, RequestContext,
        Response, ResponseExt, SetCookie, UploadedFile, UploadedFiles,
    };
    pub use portico_pipeline::{Handler, Middleware, Next, Pipeline, Stage};
    pub use portico_routes::{BodyHandler, HandlerRegistry, MultipartStage, RouteTable};
}
