//! # Portico Config
//!
//! Typed configuration for the Portico pipeline: five independently
//! optional TOML documents (application, authentication, logging, view,
//! upload), each shallow-merged over hard-coded defaults.
//!
//! A missing document means "all defaults"; a present document overrides
//! only the keys it names. Cross-field invariants are checked eagerly at
//! load time, before any request is served.
//!
//! ```no_run
//! use portico_config::ConfigResolver;
//!
//! # fn main() -> Result<(), portico_config::ConfigError> {
//! let config = ConfigResolver::new("config").load()?;
//! assert!(config.auth.session_expiration_ms > 0);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/portico-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod resolver;
pub mod schema;

pub use error::ConfigError;
pub use resolver::ConfigResolver;
pub use schema::{
    AppSettings, AuthSettings, LogFormat, LoggingSettings, PorticoConfig, SessionStoreKind,
    UploadSettings, ViewSettings,
};
