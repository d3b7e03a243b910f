//! The network side of the cache worker.

use super::{Request, Response};
use std::path::{Component, Path, PathBuf};

/// Failure to obtain any response at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch {url} failed: {message}")]
pub struct FetchError {
    /// The requested URL.
    pub url: String,
    /// What went wrong.
    pub message: String,
}

impl FetchError {
    /// Build an error for `url`.
    pub fn new(url: &str, message: impl Into<String>) -> Self {
        Self { url: url.to_string(), message: message.into() }
    }
}

/// Something that can perform a request.
pub trait Fetcher {
    /// Perform `request`. HTTP error statuses are responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error when no response could be obtained.
    fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Serves one origin from a directory of static files.
#[derive(Debug, Clone)]
pub struct StaticDirFetcher {
    origin: String,
    root: PathBuf,
}

impl StaticDirFetcher {
    /// Serve `root` as `origin`.
    pub fn new(origin: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Map a URL to a file under the root, or `None` if it is outside the
    /// origin or tries to climb out of the root.
    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(&self.origin)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        let path = rest.split(['?', '#']).next().unwrap_or_default().trim_start_matches('/');
        let relative = if path.is_empty() || path.ends_with('/') {
            format!("{path}index.html")
        } else {
            path.to_string()
        };
        let relative = Path::new(&relative);
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl Fetcher for StaticDirFetcher {
    fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let Some(path) = self.resolve(&request.url) else {
            return Err(FetchError::new(&request.url, "not served by this origin"));
        };
        match std::fs::read(&path) {
            Ok(body) => Ok(Response::ok(Some(content_type(&path)), body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Response::status(404)),
            Err(e) => Err(FetchError::new(&request.url, e.to_string())),
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or_default() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" | "webmanifest" => "application/json",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
