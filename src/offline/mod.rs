//! Offline asset cache worker.
//!
//! A host-independent rendition of an app-shell cache: a state machine that
//! installs a fixed manifest of assets into a versioned bucket, purges older
//! buckets on activation, and answers intercepted GET requests cache-first.
//!
//! The host drives it. Nothing here runs in the background.

pub mod fetcher;
pub mod storage;

pub use fetcher::{FetchError, Fetcher, StaticDirFetcher};
pub use storage::{CacheStorage, DirCacheStorage, MemoryCacheStorage};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Paths making up the application shell, cached on install.
pub const SHELL_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/app.js",
    "/manifest.json",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
];

/// Prefix of every bucket this worker owns.
pub const CACHE_PREFIX: &str = "taskdeck-v";

/// The bucket name for a cache version.
#[must_use]
pub fn cache_name(version: u32) -> String {
    format!("{CACHE_PREFIX}{version}")
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method, any case.
    pub method: String,
    /// Absolute URL.
    pub url: String,
}

impl Request {
    /// A GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: "GET".to_string(), url: url.into() }
    }

    /// Only GET requests over http(s) are intercepted.
    #[must_use]
    pub fn is_interceptable(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
            && (self.url.starts_with("http://") || self.url.starts_with("https://"))
    }
}

/// How the response was obtained, mirroring the fetch API's categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin.
    #[default]
    Basic,
    /// Cross-origin with CORS.
    Cors,
    /// Cross-origin without CORS.
    Opaque,
    /// A network error surfaced as a response.
    Error,
}

/// A response, as served from network or cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status.
    pub status: u16,
    /// Response category.
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    /// `Content-Type` header, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Body bytes.
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl Response {
    /// A same-origin 200 response.
    pub fn ok(content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            response_type: ResponseType::Basic,
            content_type: content_type.map(ToString::to_string),
            body: body.into(),
        }
    }

    /// A same-origin response with an arbitrary status and empty body.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self { status, response_type: ResponseType::Basic, content_type: None, body: Vec::new() }
    }

    /// Whether this response may be stored.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type != ResponseType::Error
    }
}

/// Result of an intercepted fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host should perform the request itself.
    Passthrough,
    /// Served from the cache.
    Cached(Response),
    /// Served from the network (and cached if eligible).
    Network(Response),
    /// Cache miss and the network failed. No fallback page is offered.
    Failed(String),
}

/// Control messages from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Activate now instead of waiting for clients to close.
    SkipWaiting,
}

/// Lifecycle phase of the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, not yet installed.
    #[default]
    Parsed,
    /// Caching the shell.
    Installing,
    /// Installed, waiting to take over.
    Waiting,
    /// Purging old buckets.
    Activating,
    /// Serving fetches.
    Active,
    /// Install failed; this worker will never activate.
    Redundant,
}

impl WorkerState {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`CacheWorker::install`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// URLs stored in the bucket.
    pub cached: Vec<String>,
    /// URLs that could not be stored, with the reason.
    pub failed: Vec<(String, String)>,
}

/// The cache worker state machine.
pub struct CacheWorker {
    bucket: String,
    origin: String,
    storage: Box<dyn CacheStorage>,
    fetcher: Box<dyn Fetcher>,
    state: WorkerState,
}

impl std::fmt::Debug for CacheWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWorker")
            .field("bucket", &self.bucket)
            .field("origin", &self.origin)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CacheWorker {
    /// A worker for cache `version`, serving `origin` (for example
    /// `https://taskdeck.local`, no trailing slash).
    pub fn new(
        version: u32,
        origin: impl Into<String>,
        storage: Box<dyn CacheStorage>,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        Self { bucket: cache_name(version), origin, storage, fetcher, state: WorkerState::Parsed }
    }

    /// The current phase.
    pub const fn state(&self) -> WorkerState {
        self.state
    }

    /// Name of the bucket this worker fills.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Absolute URL of each shell asset.
    pub fn shell_urls(&self) -> Vec<String> {
        SHELL_ASSETS.iter().map(|path| format!("{}{path}", self.origin)).collect()
    }

    /// Fetch every shell asset and store it in the bucket.
    ///
    /// A failed asset is logged and skipped; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerPhase` unless the worker is freshly parsed, or
    /// the storage error if the bucket cannot be opened (the worker becomes
    /// redundant).
    pub fn install(&mut self) -> Result<InstallReport> {
        self.expect_phase(WorkerState::Parsed, "install")?;
        self.state = WorkerState::Installing;

        if let Err(e) = self.storage.open(&self.bucket) {
            tracing::error!(bucket = %self.bucket, error = %e, "cannot open cache bucket");
            self.state = WorkerState::Redundant;
            return Err(e);
        }

        let mut report = InstallReport::default();
        for url in self.shell_urls() {
            match self.cache_one(&url) {
                Ok(()) => report.cached.push(url),
                Err(reason) => {
                    tracing::warn!(%url, %reason, "failed to cache shell asset");
                    report.failed.push((url, reason));
                }
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "cache installed"
        );
        self.state = WorkerState::Waiting;
        Ok(report)
    }

    fn cache_one(&self, url: &str) -> std::result::Result<(), String> {
        let response = self.fetcher.fetch(&Request::get(url)).map_err(|e| e.to_string())?;
        if !response.is_cacheable() {
            return Err(format!("status {}", response.status));
        }
        self.storage.put(&self.bucket, url, &response).map_err(|e| e.to_string())
    }

    /// Pick up a bucket installed in an earlier session: if it exists, skip
    /// the install and move to `Waiting`. Returns whether it did.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerPhase` unless the worker is freshly parsed, or a
    /// storage error if buckets cannot be listed.
    pub fn resume(&mut self) -> Result<bool> {
        self.expect_phase(WorkerState::Parsed, "resume")?;
        if self.storage.bucket_names()?.contains(&self.bucket) {
            tracing::debug!(bucket = %self.bucket, "resuming installed cache");
            self.state = WorkerState::Waiting;
            return Ok(true);
        }
        Ok(false)
    }

    /// Names of the buckets in storage.
    ///
    /// # Errors
    ///
    /// Returns a storage error if they cannot be listed.
    pub fn bucket_names(&self) -> Result<Vec<String>> {
        self.storage.bucket_names()
    }

    /// Delete every bucket except this worker's, then start serving.
    ///
    /// Returns the names of the deleted buckets.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerPhase` unless the worker is waiting, or a
    /// storage error if buckets cannot be listed.
    pub fn activate(&mut self) -> Result<Vec<String>> {
        self.expect_phase(WorkerState::Waiting, "activate")?;
        self.state = WorkerState::Activating;

        let names = match self.storage.bucket_names() {
            Ok(names) => names,
            Err(e) => {
                self.state = WorkerState::Waiting;
                return Err(e);
            }
        };

        let mut deleted = Vec::new();
        for name in names.into_iter().filter(|n| *n != self.bucket) {
            match self.storage.delete_bucket(&name) {
                Ok(true) => deleted.push(name),
                Ok(false) => {}
                Err(e) => tracing::warn!(bucket = %name, error = %e, "failed to delete old cache"),
            }
        }

        tracing::info!(bucket = %self.bucket, purged = deleted.len(), "cache activated");
        self.state = WorkerState::Active;
        Ok(deleted)
    }

    /// Handle a control message from the page.
    ///
    /// `SkipWaiting` activates a waiting worker immediately and is ignored in
    /// any other phase.
    ///
    /// # Errors
    ///
    /// Propagates activation errors.
    pub fn handle_message(&mut self, message: WorkerMessage) -> Result<()> {
        match message {
            WorkerMessage::SkipWaiting if self.state == WorkerState::Waiting => {
                self.activate().map(|_| ())
            }
            WorkerMessage::SkipWaiting => {
                tracing::debug!(state = %self.state, "skip-waiting ignored");
                Ok(())
            }
        }
    }

    /// Answer an intercepted request, cache first.
    ///
    /// Only an active worker intercepts, and only GET over http(s).
    pub fn fetch(&self, request: &Request) -> FetchOutcome {
        if self.state != WorkerState::Active || !request.is_interceptable() {
            return FetchOutcome::Passthrough;
        }

        match self.storage.get(&self.bucket, &request.url) {
            Ok(Some(hit)) => return FetchOutcome::Cached(hit),
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed"),
        }

        match self.fetcher.fetch(request) {
            Ok(response) => {
                if response.is_cacheable() {
                    if let Err(e) = self.storage.put(&self.bucket, &request.url, &response) {
                        tracing::warn!(url = %request.url, error = %e, "failed to cache response");
                    }
                }
                FetchOutcome::Network(response)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "fetch failed with no cached copy");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    fn expect_phase(&self, phase: WorkerState, action: &'static str) -> Result<()> {
        if self.state == phase {
            Ok(())
        } else {
            Err(Error::WorkerPhase { action, phase: self.state.as_str() })
        }
    }
}
