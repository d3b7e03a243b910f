//! In-process store used as a last resort and in tests.

use super::KeyValueStore;
use crate::error::{Error, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// A `HashMap` behind shared ownership. Clones see the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    values: Rc<RefCell<HashMap<String, String>>>,
    writable: Rc<Cell<bool>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, writable store.
    #[must_use]
    pub fn new() -> Self {
        Self { values: Rc::new(RefCell::new(HashMap::new())), writable: Rc::new(Cell::new(true)) }
    }

    /// Make writes succeed or fail, to simulate a full or locked store.
    pub fn set_writable(&self, writable: bool) {
        self.writable.set(writable);
    }

    fn check_writable(&self) -> Result<()> {
        if self.writable.get() {
            Ok(())
        } else {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "memory store is read-only",
            )))
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}
