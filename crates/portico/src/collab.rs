//! Collaborator seams.
//!
//! The assembler does not own persistence, templating, or environment
//! loading; the application supplies implementations of these traits and
//! the assembler sequences them at the right mount steps.

use portico_core::{BoxFuture, PorticoError, PorticoResult, Request, RequestContext, Response};
use portico_core::ResponseExt;
use portico_pipeline::Handler;
use serde_json::{Map, Value};
use std::path::Path;

/// Persistence models registered at mount step 3.
///
/// The assembler calls [`initialize`](ModelRegistry::initialize) on every
/// registry before calling [`associate`](ModelRegistry::associate) on any
/// of them, so cross-model relations always see fully-initialized models.
pub trait ModelRegistry: Send + Sync {
    /// Defines the models owned by this registry.
    fn initialize(&self) -> PorticoResult<()>;

    /// Wires relations between models. Runs after every registry has
    /// initialized.
    fn associate(&self) -> PorticoResult<()>;
}

/// Template engine bound at mount step 5.
///
/// Stored in the request context as a shared extension; route handlers
/// retrieve it to render views with the accumulated locals.
pub trait Renderer: Send + Sync {
    /// Renders the named template with the given locals.
    fn render(&self, template: &str, locals: &Map<String, Value>) -> PorticoResult<String>;
}

/// Environment-file loading at mount step 2.
pub trait EnvLoader: Send + Sync {
    /// Loads environment variables from the given file.
    fn load(&self, path: &Path) -> PorticoResult<()>;
}

/// The default env loader, backed by `dotenvy`. A missing file is not an
/// error; existing process variables are never overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotenvLoader;

impl EnvLoader for DotenvLoader {
    fn load(&self, path: &Path) -> PorticoResult<()> {
        match dotenvy::from_path(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "environment file loaded");
                Ok(())
            }
            Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no environment file, skipping");
                Ok(())
            }
            Err(err) => Err(PorticoError::configuration(format!(
                "cannot load environment file {}: {err}",
                path.display()
            ))),
        }
    }
}

/// The default terminal fallback: a plain 404 for anything no route
/// claimed.
pub struct NotFoundFallback;

impl Handler for NotFoundFallback {
    fn call<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        Box::pin(async move {
            tracing::debug!(path = request.uri().path(), "no route matched");
            Ok(Response::error(http::StatusCode::NOT_FOUND, "Not Found"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_dotenv_loader_missing_file_is_ok() {
        let loader = DotenvLoader;
        assert!(loader.load(Path::new("/nonexistent/.env")).is_ok());
    }

    #[test]
    fn test_dotenv_loader_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "PORTICO_COLLAB_TEST=loaded").unwrap();

        DotenvLoader.load(&path).unwrap();
        assert_eq!(
            std::env::var("PORTICO_COLLAB_TEST").as_deref(),
            Ok("loaded")
        );
    }

    #[tokio::test]
    async fn test_not_found_fallback() {
        use bytes::Bytes;
        use http_body_util::Full;

        let mut ctx = RequestContext::new();
        let request = http::Request::builder()
            .uri("/missing")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = NotFoundFallback.call(&mut ctx, request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    }
}
