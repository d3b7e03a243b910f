//! Document persistence.
//!
//! The whole application state is one JSON document stored under a fixed
//! key. [`StorageGateway`] owns a single [`KeyValueStore`], chosen once when
//! the gateway is opened: the primary store if it accepts a probe write,
//! otherwise the fallback.
//!
//! Persistence is best effort. A failed save is logged and dropped, and a
//! missing or corrupt document loads as the empty default.
//!
//! Saving the document that was just loaded writes back the stored text
//! unchanged, so documents written by other clients keep their exact bytes
//! until something in them actually changes.

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::models::Document;
use std::cell::RefCell;

/// Key the document is stored under.
pub const DOCUMENT_KEY: &str = "taskdeck-data";

/// Key used for the writability probe.
pub const PROBE_KEY: &str = "__taskdeck_probe__";

/// A string key-value store.
pub trait KeyValueStore {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;

    /// Whether the store accepts writes, checked by writing and removing a probe key.
    fn is_writable(&self) -> bool {
        self.set(PROBE_KEY, PROBE_KEY).and_then(|()| self.remove(PROBE_KEY)).is_ok()
    }
}

/// Loads and saves the [`Document`] through one selected backend.
pub struct StorageGateway {
    store: Box<dyn KeyValueStore>,
    key: String,
    using_fallback: bool,
    /// The document last read or written, with its stored text.
    last: RefCell<Option<(Document, String)>>,
}

impl std::fmt::Debug for StorageGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageGateway")
            .field("backend", &self.store.name())
            .field("key", &self.key)
            .field("using_fallback", &self.using_fallback)
            .finish()
    }
}

impl StorageGateway {
    /// Open a gateway, probing `primary` and building the fallback only if
    /// the probe fails.
    pub fn open<F>(primary: Box<dyn KeyValueStore>, fallback: F) -> Self
    where
        F: FnOnce() -> Box<dyn KeyValueStore>,
    {
        if primary.is_writable() {
            tracing::debug!(backend = primary.name(), "using primary store");
            return Self::build(primary, false);
        }

        let store = fallback();
        tracing::warn!(
            primary = primary.name(),
            fallback = store.name(),
            "primary store is not writable, using fallback"
        );
        Self::build(store, true)
    }

    /// Use a single store without probing.
    pub fn with_store(store: Box<dyn KeyValueStore>) -> Self {
        Self::build(store, false)
    }

    fn build(store: Box<dyn KeyValueStore>, using_fallback: bool) -> Self {
        Self { store, key: DOCUMENT_KEY.to_string(), using_fallback, last: RefCell::new(None) }
    }

    /// Store the document under a different key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self.last = RefCell::new(None);
        self
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Whether the fallback store was selected.
    pub const fn using_fallback(&self) -> bool {
        self.using_fallback
    }

    /// Load the document, or the default document if none is stored or it
    /// cannot be read.
    pub fn load(&self) -> Document {
        match self.try_load() {
            Ok(Some(doc)) => doc,
            Ok(None) => Document::default(),
            Err(e) => {
                tracing::warn!(backend = self.store.name(), error = %e, "failed to load document");
                Document::default()
            }
        }
    }

    /// Load the document, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or the stored value is
    /// not a valid document.
    pub fn try_load(&self) -> Result<Option<Document>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let doc: Document = serde_json::from_str(&raw)?;
        *self.last.borrow_mut() = Some((doc.clone(), raw));
        Ok(Some(doc))
    }

    /// Save the document. Failures are logged and swallowed.
    pub fn save(&self, doc: &Document) {
        if let Err(e) = self.try_save(doc) {
            tracing::error!(backend = self.store.name(), error = %e, "failed to save document");
        }
    }

    /// Save the document, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn try_save(&self, doc: &Document) -> Result<()> {
        let unchanged = match &*self.last.borrow() {
            Some((last, raw)) if last == doc => Some(raw.clone()),
            _ => None,
        };
        let raw = match unchanged {
            Some(raw) => raw,
            None => serde_json::to_string(doc)?,
        };
        self.store.set(&self.key, &raw)?;
        *self.last.borrow_mut() = Some((doc.clone(), raw));
        Ok(())
    }

    /// The raw stored text, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn raw(&self) -> Result<Option<String>> {
        self.store.get(&self.key)
    }
}
