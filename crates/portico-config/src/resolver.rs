//! Configuration resolver.
//!
//! [`ConfigResolver`] loads the five configuration documents from a
//! directory, merges each over its defaults, and runs eager cross-field
//! validation. Loading happens once per process, at mount time.

use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::{
    AppSettings, AuthSettings, LoggingSettings, PorticoConfig, SessionStoreKind, UploadSettings,
    ViewSettings,
};
use crate::ConfigError;
use serde::de::DeserializeOwned;

/// Loads the five optional configuration documents.
///
/// Each document lives in its own file under the config directory:
/// `application.toml`, `auth.toml`, `logging.toml`, `view.toml`,
/// `upload.toml`. A missing file yields that document's defaults; a
/// present file overrides only the keys it names.
///
/// # Example
///
/// ```no_run
/// use portico_config::ConfigResolver;
///
/// # fn main() -> Result<(), portico_config::ConfigError> {
/// let config = ConfigResolver::new("config").load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigResolver {
    dir: PathBuf,
}

impl ConfigResolver {
    /// Creates a resolver rooted at the given config directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loads all documents and validates the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any present document cannot be read or
    /// parsed, or if a cross-field invariant is violated. All such errors
    /// are fatal: the process must not begin serving.
    pub fn load(&self) -> Result<PorticoConfig, ConfigError> {
        let config = PorticoConfig {
            app: self.load_document::<AppSettings>("application.toml")?,
            auth: self.load_document::<AuthSettings>("auth.toml")?,
            logging: self.load_document::<LoggingSettings>("logging.toml")?,
            view: self.load_document::<ViewSettings>("view.toml")?,
            upload: self.load_document::<UploadSettings>("upload.toml")?,
        };

        Self::validate(&config)?;
        Ok(config)
    }

    /// Loads one optional document, falling back to defaults when the
    /// file is absent.
    fn load_document<T>(&self, name: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(T::default());
        }

        let content =
            fs::read_to_string(&path).map_err(|e| ConfigError::read_error(&path, e))?;
        toml::from_str(&content).map_err(|e| ConfigError::parse_error(&path, e))
    }

    /// Cross-field invariants, checked before any request is served.
    fn validate(config: &PorticoConfig) -> Result<(), ConfigError> {
        if config.auth.session_store == SessionStoreKind::External
            && config.auth.store_address.is_none()
        {
            return Err(ConfigError::MissingStoreAddress);
        }

        if config.auth.session_expiration_ms == 0 {
            return Err(ConfigError::invalid(
                "auth.session_expiration_ms must be greater than zero",
            ));
        }

        Ok(())
    }

    /// The directory this resolver reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
