//! Filesystem-derived route table.
//!
//! The table is built once at mount time by scanning the configured
//! routes directory. Each file maps to a URL derived purely from its
//! relative path: directory segments are kept verbatim, the extension is
//! dropped, and the final name segment is lower-cased. The handler for a
//! derived URL comes from the [`HandlerRegistry`]; files with no
//! registered handler are skipped with a warning rather than failing the
//! mount.
//!
//! Two files deriving the same URL is a configuration mistake and fails
//! the scan, so it surfaces at startup instead of as shadowed routes.

use crate::multipart::MultipartStage;
use portico_core::{BoxFuture, PorticoError, PorticoResult, Request, RequestContext, Response};
use portico_pipeline::{Handler, Middleware, Next};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use walkdir::WalkDir;

/// Derives a route URL from a path relative to the routes directory.
///
/// Returns `None` for paths that do not fit the `dir/.../name.ext`
/// shape: no extension, an empty name, or non-UTF-8 segments. Directory
/// segments keep their case; only the final name segment is lower-cased.
#[must_use]
pub fn derive_url(relative: &Path) -> Option<String> {
    let stem = relative.file_stem()?.to_str()?;
    relative.extension()?.to_str()?;
    if stem.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            match component {
                std::path::Component::Normal(segment) => segments.push(segment.to_str()?),
                std::path::Component::CurDir => {}
                _ => return None,
            }
        }
    }

    let name = stem.to_lowercase();
    let mut url = String::from("/");
    for segment in segments {
        url.push_str(segment);
        url.push('/');
    }
    url.push_str(&name);
    Some(url)
}

fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Maps derived URLs to their handlers.
///
/// The application registers a handler per route file before the scan;
/// the scan then pairs each discovered file with its handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for a derived URL, such as `/api/widgets`.
    /// Replaces any previous handler for the same URL.
    pub fn register<H: Handler + 'static>(&mut self, url: impl Into<String>, handler: H) {
        self.handlers.insert(url.into(), Arc::new(handler));
    }

    /// Registers an already-shared handler.
    pub fn register_arc(&mut self, url: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(url.into(), handler);
    }

    /// Looks up the handler for a derived URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(url).cloned()
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// One dispatchable route.
struct RouteEntry {
    url: String,
    handler: Arc<dyn Handler>,
}

/// The immutable route table, installed as the `routes` stage.
///
/// Dispatch is an exact match on the normalized request path (trailing
/// slash stripped). A miss falls through to the next stage, so the
/// terminal fallback renders the 404.
pub struct RouteTable {
    routes: HashMap<String, RouteEntry>,
    multipart: Arc<MultipartStage>,
}

impl RouteTable {
    /// Scans the routes directory and builds the table.
    ///
    /// Files with an underivable path or no registered handler are
    /// skipped with a warning. When `default_route` names a derived URL,
    /// that route is additionally reachable at `/`.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be walked or when two files derive
    /// the same URL.
    pub fn scan(
        routes_dir: &Path,
        registry: &HandlerRegistry,
        default_route: Option<&str>,
        multipart: MultipartStage,
    ) -> PorticoResult<Self> {
        let mut routes: HashMap<String, RouteEntry> = HashMap::new();
        let default_route = default_route.map(normalize_path);

        for entry in WalkDir::new(routes_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                PorticoError::route_scan(format!(
                    "cannot walk routes directory {}: {e}",
                    routes_dir.display()
                ))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(routes_dir).map_err(|e| {
                PorticoError::route_scan(format!(
                    "route file escapes the routes directory: {e}"
                ))
            })?;

            let Some(url) = derive_url(relative) else {
                tracing::warn!(path = %relative.display(), "route file skipped: underivable path");
                continue;
            };

            let Some(handler) = registry.get(&url) else {
                tracing::warn!(%url, path = %relative.display(), "route file skipped: no handler registered");
                continue;
            };

            if default_route == Some(url.as_str()) {
                Self::insert(&mut routes, "/".to_string(), handler.clone())?;
            }
            Self::insert(&mut routes, url, handler)?;
        }

        tracing::info!(routes = routes.len(), "route table built");
        Ok(Self {
            routes,
            multipart: Arc::new(multipart),
        })
    }

    fn insert(
        routes: &mut HashMap<String, RouteEntry>,
        url: String,
        handler: Arc<dyn Handler>,
    ) -> PorticoResult<()> {
        if routes.contains_key(&url) {
            return Err(PorticoError::route_scan(format!(
                "two route files derive the same URL {url}"
            )));
        }
        routes.insert(
            url.clone(),
            RouteEntry { url, handler },
        );
        Ok(())
    }

    /// Returns all derived URLs, sorted.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.routes.values().map(|r| r.url.as_str()).collect();
        urls.sort_unstable();
        urls
    }

    /// True if a route exists for the normalized path.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(normalize_path(path))
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.urls())
            .finish_non_exhaustive()
    }
}

impl Middleware for RouteTable {
    fn name(&self) -> &'static str {
        "routes"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        Box::pin(async move {
            let path = normalize_path(request.uri().path()).to_string();
            match self.routes.get(&path) {
                Some(entry) => {
                    // Every route chain starts with the multipart stage,
                    // so handlers always see parsed form fields.
                    let chain = Next::new(
                        self.multipart.as_ref(),
                        Next::handler(entry.handler.clone()),
                    );
                    chain.run(ctx, request).await
                }
                None => next.run(ctx, request).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use portico_config::UploadSettings;
    use std::fs;
    use tempfile::TempDir;

    struct NamedHandler(&'static str);

    impl Handler for NamedHandler {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut RequestContext,
            _request: Request,
        ) -> BoxFuture<'a, PorticoResult<Response>> {
            let name = self.0;
            Box::pin(async move {
                Ok(HttpResponse::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::from(name)))
                    .expect("response"))
            })
        }
    }

    struct NotFoundHandler;

    impl Handler for NotFoundHandler {
        fn call<'a>(
            &'a self,
            _ctx: &'a mut RequestContext,
            _request: Request,
        ) -> BoxFuture<'a, PorticoResult<Response>> {
            Box::pin(async {
                Ok(HttpResponse::builder()
                    .status(StatusCode::NOT_FOUND)
                    .body(Full::new(Bytes::new()))
                    .expect("response"))
            })
        }
    }

    fn write_route(dir: &Path, relative: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "route file").unwrap();
    }

    fn stage() -> MultipartStage {
        MultipartStage::new(UploadSettings::default())
    }

    #[test]
    fn test_derive_url_nested() {
        assert_eq!(
            derive_url(Path::new("api/widgets.rs")).as_deref(),
            Some("/api/widgets")
        );
        assert_eq!(
            derive_url(Path::new("admin/users/Index.html")).as_deref(),
            Some("/admin/users/index")
        );
    }

    #[test]
    fn test_derive_url_lowercases_only_the_name() {
        assert_eq!(
            derive_url(Path::new("API/Widgets.rs")).as_deref(),
            Some("/API/widgets")
        );
    }

    #[test]
    fn test_derive_url_rejects_missing_extension() {
        assert_eq!(derive_url(Path::new("api/widgets")), None);
        assert_eq!(derive_url(Path::new(".hidden")), None);
    }

    #[test]
    fn test_scan_builds_table() {
        let dir = TempDir::new().unwrap();
        write_route(dir.path(), "home.html");
        write_route(dir.path(), "api/widgets.html");

        let mut registry = HandlerRegistry::new();
        registry.register("/home", NamedHandler("home"));
        registry.register("/api/widgets", NamedHandler("widgets"));

        let table = RouteTable::scan(dir.path(), &registry, None, stage()).unwrap();
        assert_eq!(table.urls(), vec!["/api/widgets", "/home"]);
    }

    #[test]
    fn test_scan_skips_unregistered_files() {
        let dir = TempDir::new().unwrap();
        write_route(dir.path(), "home.html");
        write_route(dir.path(), "orphan.html");

        let mut registry = HandlerRegistry::new();
        registry.register("/home", NamedHandler("home"));

        let table = RouteTable::scan(dir.path(), &registry, None, stage()).unwrap();
        assert_eq!(table.urls(), vec!["/home"]);
    }

    #[test]
    fn test_scan_rejects_duplicate_urls() {
        let dir = TempDir::new().unwrap();
        write_route(dir.path(), "Widgets.html");
        write_route(dir.path(), "widgets.html");

        let mut registry = HandlerRegistry::new();
        registry.register("/widgets", NamedHandler("widgets"));

        let err = RouteTable::scan(dir.path(), &registry, None, stage()).unwrap_err();
        assert!(err.to_string().contains("/widgets"));
    }

    #[test]
    fn test_default_route_aliases_root() {
        let dir = TempDir::new().unwrap();
        write_route(dir.path(), "home.html");

        let mut registry = HandlerRegistry::new();
        registry.register("/home", NamedHandler("home"));

        let table =
            RouteTable::scan(dir.path(), &registry, Some("/home"), stage()).unwrap();
        assert!(table.contains("/"));
        assert!(table.contains("/home"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_scan_fails_on_missing_directory() {
        let registry = HandlerRegistry::new();
        let result = RouteTable::scan(
            Path::new("/nonexistent/routes"),
            &registry,
            None,
            stage(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_hits_route_and_falls_through() {
        let dir = TempDir::new().unwrap();
        write_route(dir.path(), "api/widgets.html");

        let mut registry = HandlerRegistry::new();
        registry.register("/api/widgets", NamedHandler("widgets"));

        let table = RouteTable::scan(dir.path(), &registry, None, stage()).unwrap();

        let mut ctx = RequestContext::new();
        let request = http::Request::builder()
            .uri("/api/widgets/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let next = Next::new(&table, Next::handler(Arc::new(NotFoundHandler)));
        let response = next.run(&mut ctx, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut ctx = RequestContext::new();
        let request = http::Request::builder()
            .uri("/missing")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let next = Next::new(&table, Next::handler(Arc::new(NotFoundHandler)));
        let response = next.run(&mut ctx, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
