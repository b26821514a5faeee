//! # Portico Auth
//!
//! The session-backed authentication gate. Per request the gate decides
//! to pass, redirect, or reject:
//!
//! - allow-listed paths pass without any authentication work;
//! - a valid session re-hydrates the principal via the subscribe hook,
//!   binds it into the render locals, and passes (or bounces an
//!   already-authenticated interactive caller off the login page);
//! - without a session, programmatic callers get a bare `401` and
//!   interactive callers are redirected to the failure target — unless
//!   they are already on it, so the login page stays reachable.
//!
//! Credential verification (`login`) and `logout` are explicit actions
//! invoked by route handlers, not part of the per-request decision.
//!
//! All user-supplied hooks return boxed futures; synchronous hook
//! authors wrap their value in an already-ready future. The gate never
//! inspects a hook's nature at runtime.

#![doc(html_root_url = "https://docs.rs/portico-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod allow;
pub mod gate;
pub mod hooks;
pub mod session;

pub use allow::{AllowList, AllowRule};
pub use gate::AuthGate;
pub use hooks::{AuthHooks, AuthenticateHook, CallerKindPredicate, FailureRedirect, SubscribeHook};
pub use session::{MemorySessionStore, SessionStore};
