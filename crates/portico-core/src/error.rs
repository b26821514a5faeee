//! Error types for Portico.
//!
//! [`PorticoError`] is the standard error type used throughout the
//! pipeline. Decision-path outcomes that are not failures (wrong
//! credentials, an unmatched route) are expressed as ordinary values,
//! never as errors; everything here represents a genuine fault.
//!
//! Errors raised inside a request flow down the middleware chain to the
//! terminal fallback handler installed last in the pipeline, which owns
//! the user-visible rendering. Configuration errors are raised before any
//! request is served and are fatal.

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`PorticoError`].
pub type PorticoResult<T> = Result<T, PorticoError>;

/// Standard error type for Portico.
#[derive(Error, Debug)]
pub enum PorticoError {
    /// Invalid or inconsistent configuration, detected at startup.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Authentication machinery failed (not a credentials mismatch).
    #[error("authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// A user-supplied hook (authenticate, subscribe, upload resolver)
    /// returned an error.
    #[error("hook error: {message}")]
    Hook {
        /// Human-readable error message.
        message: String,
        /// The original hook failure.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A multipart body could not be parsed.
    #[error("multipart error: {message}")]
    Multipart {
        /// Human-readable error message.
        message: String,
    },

    /// Route discovery failed at startup.
    #[error("route scan error: {message}")]
    RouteScan {
        /// Human-readable error message.
        message: String,
    },

    /// An internal invariant was violated.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl PorticoError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a hook error with the original failure attached.
    pub fn hook(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Hook {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a hook error without a source.
    pub fn hook_message(message: impl Into<String>) -> Self {
        Self::Hook {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a multipart parsing error.
    pub fn multipart(message: impl Into<String>) -> Self {
        Self::Multipart {
            message: message.into(),
        }
    }

    /// Creates a route scan error.
    pub fn route_scan(message: impl Into<String>) -> Self {
        Self::RouteScan {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::Multipart { .. } => StatusCode::BAD_REQUEST,
            Self::Configuration { .. }
            | Self::Hook { .. }
            | Self::RouteScan { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a short machine-readable code for JSON error envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::Authentication { .. } => "authentication_error",
            Self::Hook { .. } => "hook_error",
            Self::Multipart { .. } => "multipart_error",
            Self::RouteScan { .. } => "route_scan_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// True if the error is fatal at startup (the process should not
    /// begin serving).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::RouteScan { .. })
    }
}
