//! User preferences stored in the document.

use crate::events::{Event, EventBus};
use crate::models::{DarkMode, Settings};
use crate::storage::StorageGateway;
use std::rc::Rc;

/// Reads and writes [`Settings`].
///
/// Settings are small, so every call goes straight to the gateway rather
/// than caching.
#[derive(Debug)]
pub struct SettingsManager {
    gateway: Rc<StorageGateway>,
    bus: Rc<EventBus>,
}

impl SettingsManager {
    /// Create a manager over the shared gateway and bus.
    pub fn new(gateway: Rc<StorageGateway>, bus: Rc<EventBus>) -> Self {
        Self { gateway, bus }
    }

    /// Current settings.
    pub fn get(&self) -> Settings {
        self.gateway.load().settings
    }

    /// Change the theme preference.
    pub fn set_dark_mode(&self, mode: DarkMode) -> Settings {
        self.change(|s| s.dark_mode = mode)
    }

    /// Turn reminder notifications on or off.
    pub fn set_notifications(&self, enabled: bool) -> Settings {
        self.change(|s| s.notifications = enabled)
    }

    fn change<F: FnOnce(&mut Settings)>(&self, edit: F) -> Settings {
        let mut doc = self.gateway.load();
        edit(&mut doc.settings);
        self.gateway.save(&doc);
        self.bus.publish(&Event::SettingsUpdated(doc.settings.clone()));
        doc.settings
    }
}
