//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal at startup; the process should not begin
/// serving with a broken configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file contains invalid TOML.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// An external session store was requested without an address.
    #[error("auth.session_store is \"external\" but auth.store_address is not set")]
    MissingStoreAddress,

    /// A cross-field invariant was violated.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// Human-readable description of the violation.
        message: String,
    },
}

impl ConfigError {
    /// Creates a read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse_error(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseError {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Creates an invalid-configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<ConfigError> for portico_core::PorticoError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}
