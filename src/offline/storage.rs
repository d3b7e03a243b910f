//! Named buckets of cached responses.

use super::Response;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Bucketed response storage keyed by request URL.
pub trait CacheStorage {
    /// Create a bucket if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket cannot be created.
    fn open(&self, bucket: &str) -> Result<()>;

    /// Names of all buckets, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the buckets cannot be listed.
    fn bucket_names(&self) -> Result<Vec<String>>;

    /// Delete a bucket and everything in it. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn delete_bucket(&self, bucket: &str) -> Result<bool>;

    /// Look up a cached response.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be read.
    fn get(&self, bucket: &str, url: &str) -> Result<Option<Response>>;

    /// Store a response, creating the bucket if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    fn put(&self, bucket: &str, url: &str, response: &Response) -> Result<()>;
}

type Buckets = BTreeMap<String, BTreeMap<String, Response>>;

/// In-memory buckets. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStorage {
    buckets: Rc<RefCell<Buckets>>,
}

impl MemoryCacheStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn open(&self, bucket: &str) -> Result<()> {
        self.buckets.borrow_mut().entry(bucket.to_string()).or_default();
        Ok(())
    }

    fn bucket_names(&self) -> Result<Vec<String>> {
        Ok(self.buckets.borrow().keys().cloned().collect())
    }

    fn delete_bucket(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.borrow_mut().remove(bucket).is_some())
    }

    fn get(&self, bucket: &str, url: &str) -> Result<Option<Response>> {
        Ok(self.buckets.borrow().get(bucket).and_then(|b| b.get(url)).cloned())
    }

    fn put(&self, bucket: &str, url: &str, response: &Response) -> Result<()> {
        self.buckets
            .borrow_mut()
            .entry(bucket.to_string())
            .or_default()
            .insert(url.to_string(), response.clone());
        Ok(())
    }
}

/// Metadata written next to each cached body.
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    #[serde(flatten)]
    response: Response,
}

/// Buckets as directories under a root.
///
/// Each entry is `<hash>.json` (URL and headers) plus `<hash>.body`.
#[derive(Debug, Clone)]
pub struct DirCacheStorage {
    root: PathBuf,
}

impl DirCacheStorage {
    /// Storage rooted at `root`, created lazily.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        let valid = !bucket.is_empty()
            && !bucket.starts_with('.')
            && bucket.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(self.root.join(bucket))
        } else {
            Err(Error::Validation(format!("invalid cache bucket name: {bucket:?}")))
        }
    }

    fn entry_paths(&self, bucket: &str, url: &str) -> Result<(PathBuf, PathBuf)> {
        let dir = self.bucket_dir(bucket)?;
        let stem = url_hash(url);
        Ok((dir.join(format!("{stem}.json")), dir.join(format!("{stem}.body"))))
    }
}

/// Hex SHA-256 of the URL, used as the entry file stem.
fn url_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl CacheStorage for DirCacheStorage {
    fn open(&self, bucket: &str) -> Result<()> {
        fs::create_dir_all(self.bucket_dir(bucket)?)?;
        Ok(())
    }

    fn bucket_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_bucket(&self, bucket: &str) -> Result<bool> {
        match fs::remove_dir_all(self.bucket_dir(bucket)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, bucket: &str, url: &str) -> Result<Option<Response>> {
        let (meta_path, body_path) = self.entry_paths(bucket, url)?;
        let meta = match fs::read_to_string(&meta_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: EntryMeta = serde_json::from_str(&meta)?;
        // Hash collision: treat as a miss.
        if meta.url != url {
            return Ok(None);
        }
        let mut response = meta.response;
        response.body = fs::read(body_path)?;
        Ok(Some(response))
    }

    fn put(&self, bucket: &str, url: &str, response: &Response) -> Result<()> {
        self.open(bucket)?;
        let (meta_path, body_path) = self.entry_paths(bucket, url)?;
        fs::write(&body_path, &response.body)?;
        let meta = EntryMeta { url: url.to_string(), response: response.clone() };
        fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)?;
        Ok(())
    }
}
