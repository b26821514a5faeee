//! Shared helpers for the integration tests.
#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::Full;
use portico::prelude::*;
use portico_core::BoxFuture;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A route handler answering with a fixed body.
pub struct EchoHandler(pub &'static str);

impl Handler for EchoHandler {
    fn call<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        _request: Request,
    ) -> BoxFuture<'a, PorticoResult<Response>> {
        let body = self.0;
        Box::pin(async move {
            Ok(http::Response::builder()
                .status(http::StatusCode::OK)
                .body(Full::new(Bytes::from(body)))
                .expect("response"))
        })
    }
}

/// Creates a project directory containing the given route files.
pub fn project(routes: &[&str]) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for relative in routes {
        let path = dir.path().join("routes").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("route dirs");
        }
        fs::write(path, "route file").expect("route file");
    }
    dir
}

/// Default configuration rooted at the given project directory, with
/// environment loading disabled.
pub fn base_config(root: &Path) -> PorticoConfig {
    let mut config = PorticoConfig::default();
    config.app.root_path = root.to_string_lossy().into_owned();
    config.app.env_file = None;
    config
}

pub fn get(path: &str) -> Request {
    http::Request::builder()
        .uri(path)
        .body(Full::new(Bytes::new()))
        .expect("request")
}

pub fn get_programmatic(path: &str) -> Request {
    http::Request::builder()
        .uri(path)
        .header("x-requested-with", "XMLHttpRequest")
        .body(Full::new(Bytes::new()))
        .expect("request")
}

pub fn get_with_cookie(path: &str, cookie: &str) -> Request {
    http::Request::builder()
        .uri(path)
        .header(http::header::COOKIE, cookie)
        .body(Full::new(Bytes::new()))
        .expect("request")
}

pub async fn body_text(response: Response) -> String {
    use http_body_util::BodyExt;
    let collected = match response.into_body().collect().await {
        Ok(collected) => collected,
        Err(never) => match never {},
    };
    String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8 body")
}
