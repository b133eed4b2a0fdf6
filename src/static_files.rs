//! Static file serving.
//!
//! # Responsibilities
//! - Map a catch-all route parameter to a file under a root directory
//! - Refuse paths that would leave the root
//! - Guess the content type from the file extension
//!
//! # Design Decisions
//! - Files are read on every request; no caching
//! - Reads run on the dispatch thread, which is already off the async runtime

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::context::{handler, Context, HandlerFunc};

/// A directory exposed through a catch-all route.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    param: String,
}

impl StaticFiles {
    /// Serve files under `root`, taking the relative path from route
    /// parameter `param`.
    pub fn new(root: impl Into<PathBuf>, param: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            param: param.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` under the root, or `None` if it escapes.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        (safe && !relative.as_os_str().is_empty()).then(|| self.root.join(relative))
    }

    pub fn handler(self) -> HandlerFunc {
        let files = Arc::new(self);
        handler(move |c: &mut Context| files.serve(c))
    }

    fn serve(&self, c: &mut Context) {
        let relative = c.param(&self.param).unwrap_or_default().to_string();
        let Some(path) = self.resolve(&relative) else {
            tracing::warn!(path = %relative, "Rejected static file path");
            c.string(StatusCode::BAD_REQUEST, "invalid file path");
            return;
        };

        match fs::read(&path) {
            Ok(bytes) => c.data(StatusCode::OK, content_type(&path), &bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let body = format!("404 NOT FOUND: {}", c.path());
                c.string(StatusCode::NOT_FOUND, body);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Static file read failed");
                c.string(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
