//! Configuration document schemas.
//!
//! Each struct here maps to one optional TOML document. Every field has a
//! serde default, so a document only needs to name the keys it overrides.

use serde::{Deserialize, Serialize};

/// The fully resolved configuration: all five documents merged over
/// defaults and validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PorticoConfig {
    /// Application document (`application.toml`).
    #[serde(default)]
    pub app: AppSettings,
    /// Authentication document (`auth.toml`).
    #[serde(default)]
    pub auth: AuthSettings,
    /// Logging document (`logging.toml`).
    #[serde(default)]
    pub logging: LoggingSettings,
    /// View document (`view.toml`).
    #[serde(default)]
    pub view: ViewSettings,
    /// Upload document (`upload.toml`).
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Application-wide settings.
///
/// # Example
///
/// ```
/// let settings: portico_config::AppSettings = toml::from_str(
///     "routes_dir = \"routes\"\ndefault_route = \"/home\"",
/// ).unwrap();
/// assert_eq!(settings.default_route.as_deref(), Some("/home"));
/// assert_eq!(settings.static_dir, "public");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSettings {
    /// Application root path, installed as a process-wide global.
    #[serde(default = "default_root_path")]
    pub root_path: String,

    /// Directory scanned for route handler files.
    #[serde(default = "default_routes_dir")]
    pub routes_dir: String,

    /// Route URL additionally aliased to `/`, if any.
    #[serde(default)]
    pub default_route: Option<String>,

    /// Environment file loaded at mount time. `None` disables loading;
    /// a configured file that does not exist is skipped silently.
    #[serde(default = "default_env_file")]
    pub env_file: Option<String>,

    /// Directory served as static files by the host server.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Enable the CORS stage.
    #[serde(default)]
    pub cors_enabled: bool,

    /// Allowed CORS origins. Empty with `cors_enabled` means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            routes_dir: default_routes_dir(),
            default_route: None,
            env_file: default_env_file(),
            static_dir: default_static_dir(),
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}

fn default_root_path() -> String {
    ".".to_string()
}

fn default_routes_dir() -> String {
    "routes".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_env_file() -> Option<String> {
    Some(".env".to_string())
}

fn default_static_dir() -> String {
    "public".to_string()
}

/// Which session store backs the auth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    /// In-process map, suitable for a single instance.
    #[default]
    Memory,
    /// External key-value store; requires `store_address`.
    External,
}

/// Authentication settings.
///
/// The serializable half of the auth configuration. Hooks, the dynamic
/// failure-redirect target, and pattern allow-list entries are runtime
/// values supplied through `portico-auth`'s builder; entries listed in
/// `allow_unauthenticated` here are matched as literal path substrings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    /// Enable the auth gate. Disabled means every request passes.
    #[serde(default)]
    pub enabled: bool,

    /// Session store backing.
    #[serde(default)]
    pub session_store: SessionStoreKind,

    /// Address of the external session store, when
    /// `session_store = "external"`.
    #[serde(default)]
    pub store_address: Option<String>,

    /// Session cookie name.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Set the `Secure` attribute on the session cookie.
    #[serde(default)]
    pub cookie_secure: bool,

    /// Set the `HttpOnly` attribute on the session cookie.
    #[serde(default = "default_true")]
    pub cookie_http_only: bool,

    /// Name of the username field in the login form.
    #[serde(default = "default_user_field")]
    pub user_field: String,

    /// Name of the password field in the login form.
    #[serde(default = "default_pass_field")]
    pub pass_field: String,

    /// Where an authenticated caller is sent after login (and away from
    /// the login page).
    #[serde(default = "default_success_redirect")]
    pub success_redirect: String,

    /// Where an unauthenticated interactive caller is redirected.
    /// A dynamic target configured at runtime takes precedence.
    #[serde(default = "default_failure_redirect")]
    pub failure_redirect: String,

    /// Paths exempt from authentication, matched as literal substrings
    /// of the normalized request path, in declaration order.
    #[serde(default)]
    pub allow_unauthenticated: Vec<String>,

    /// Session lifetime in milliseconds after the last write.
    #[serde(default = "default_session_expiration_ms")]
    pub session_expiration_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            session_store: SessionStoreKind::Memory,
            store_address: None,
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            cookie_http_only: default_true(),
            user_field: default_user_field(),
            pass_field: default_pass_field(),
            success_redirect: default_success_redirect(),
            failure_redirect: default_failure_redirect(),
            allow_unauthenticated: Vec::new(),
            session_expiration_ms: default_session_expiration_ms(),
        }
    }
}

fn default_cookie_name() -> String {
    "portico.sid".to_string()
}

fn default_true() -> bool {
    true
}

fn default_user_field() -> String {
    "email".to_string()
}

fn default_pass_field() -> String {
    "password".to_string()
}

fn default_success_redirect() -> String {
    "/".to_string()
}

fn default_failure_redirect() -> String {
    "/login".to_string()
}

fn default_session_expiration_ms() -> u64 {
    86_400_000
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Emit one access-log line per request.
    #[serde(default = "default_true")]
    pub access_log: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            access_log: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// View / template-engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSettings {
    /// Directory containing view templates.
    #[serde(default = "default_views_dir")]
    pub views_dir: String,

    /// Template file extension registered with the renderer.
    #[serde(default = "default_view_ext")]
    pub extension: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            views_dir: default_views_dir(),
            extension: default_view_ext(),
        }
    }
}

fn default_views_dir() -> String {
    "views".to_string()
}

fn default_view_ext() -> String {
    "html".to_string()
}

/// Upload settings.
///
/// The resolver that picks a body-parsing handler per request is runtime
/// configuration, supplied through `portico-routes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadSettings {
    /// Enable resolver-driven upload handling. When disabled, multipart
    /// bodies are parsed for fields only and file parts are discarded.
    #[serde(default)]
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PorticoConfig::default();
        assert!(!config.auth.enabled);
        assert_eq!(config.auth.cookie_name, "portico.sid");
        assert!(config.auth.cookie_http_only);
        assert_eq!(config.auth.session_expiration_ms, 86_400_000);
        assert_eq!(config.app.routes_dir, "routes");
        assert_eq!(config.app.env_file.as_deref(), Some(".env"));
        assert!(!config.upload.enabled);
    }

    #[test]
    fn test_partial_document_merges_over_defaults() {
        let auth: AuthSettings =
            toml::from_str("enabled = true\ncookie_secure = true").unwrap();
        assert!(auth.enabled);
        assert!(auth.cookie_secure);
        // Untouched keys keep their defaults.
        assert_eq!(auth.failure_redirect, "/login");
        assert_eq!(auth.user_field, "email");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<AuthSettings, _> = toml::from_str("no_such_key = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_session_store_kind_names() {
        let auth: AuthSettings = toml::from_str("session_store = \"external\"").unwrap();
        assert_eq!(auth.session_store, SessionStoreKind::External);
    }
}
