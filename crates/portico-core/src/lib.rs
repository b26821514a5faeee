//! # Portico Core
//!
//! Core types shared by every Portico crate: the HTTP request/response
//! aliases, the per-request context, the authenticated principal record,
//! cookie helpers, and the error taxonomy.
//!
//! Portico does not own a socket layer. The host HTTP server hands each
//! request to the assembled pipeline as a [`Request`] and receives a
//! [`Response`] back; everything in this crate is transport-agnostic.

#![doc(html_root_url = "https://docs.rs/portico-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod cookie;
pub mod error;
pub mod form;
pub mod principal;
pub mod types;

pub use context::RequestContext;
pub use cookie::{Cookies, SameSite, SetCookie};
pub use error::{PorticoError, PorticoResult};
pub use form::{FormFields, UploadedFile, UploadedFiles};
pub use principal::Principal;
pub use types::{BoxFuture, Request, RequestHead, Response, ResponseExt};
