//! # Portico Pipeline
//!
//! The middleware machinery behind the Portico request pipeline: the
//! [`Middleware`] trait, the consuming [`Next`] chain, and the ordered
//! [`Pipeline`] with its named [`Stage`]s.
//!
//! The stage order is a hard invariant of the framework. Stages are
//! installed by the assembler in a fixed sequence and cannot be reordered
//! afterwards; tests assert the order structurally via
//! [`Pipeline::stage_names`].
//!
//! ```text
//! Request → Ingest → Views → Cors → Locals → AuthGate → Routes → Fallback
//! ```
//!
//! (Globals, environment loading, and model registration are startup
//! effects sequenced before the request stages; they appear in the
//! [`Stage`] enum so the full assembly order is assertable.)

#![doc(html_root_url = "https://docs.rs/portico-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;

pub use middleware::{FnMiddleware, Handler, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, Stage};
