//! # Portico Routes
//!
//! The filesystem-derived route table and the multipart negotiation stage
//! it injects ahead of every route handler.
//!
//! Routing is decided entirely at mount time: the routes directory is
//! scanned once, every file derives a URL from its relative path, and the
//! resulting [`RouteTable`] is immutable. Requests that match run their
//! route chain (multipart stage, then handler); misses fall through to
//! the pipeline's terminal fallback.
//!
//! ```no_run
//! use portico_routes::{HandlerRegistry, MultipartStage, RouteTable};
//! use portico_config::UploadSettings;
//! use std::path::Path;
//!
//! # fn demo(registry: &HandlerRegistry) -> portico_core::PorticoResult<()> {
//! let table = RouteTable::scan(
//!     Path::new("routes"),
//!     registry,
//!     Some("/home"),
//!     MultipartStage::new(UploadSettings::default()),
//! )?;
//! assert!(table.contains("/home"));
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/portico-routes/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod multipart;
pub mod table;

pub use multipart::{
    AnyFiles, BodyHandler, FieldsOnly, MultipartStage, SingleFile, UploadResolver,
};
pub use table::{derive_url, HandlerRegistry, RouteTable};
