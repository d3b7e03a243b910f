//! Debug event logging.
//!
//! When `event_log` is enabled in the config, every bus event is appended as
//! a JSONL line to `events.jsonl` in the data directory. Useful for seeing
//! exactly what a command changed.

use crate::events::{EventBus, SubscriptionId, WILDCARD};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Log file name within the data directory.
pub const EVENTS_FILE: &str = "events.jsonl";

/// Path of the event log for a data directory.
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(EVENTS_FILE)
}

/// Subscribe a JSONL writer to every event on `bus`.
pub fn attach(bus: &EventBus, data_dir: &Path) -> SubscriptionId {
    let path = log_path(data_dir);
    bus.subscribe(WILDCARD, move |event| {
        append(&path, event.name(), &event.payload())?;
        Ok(())
    })
}

/// Append one entry.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append(path: &Path, event: &str, payload: &serde_json::Value) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let entry = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "event": event,
        "payload": payload,
    });
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{entry}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use crate::models::Settings;
    use tempfile::TempDir;

    fn read_log_lines(dir: &Path) -> Vec<serde_json::Value> {
        let path = log_path(dir);
        if !path.exists() {
            return vec![];
        }
        std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_attached_log_records_events() {
        let dir = TempDir::new().unwrap();
        let bus = EventBus::new();
        attach(&bus, dir.path());

        bus.publish(&Event::SettingsUpdated(Settings::default()));
        bus.publish(&Event::SettingsUpdated(Settings::default()));

        let lines = read_log_lines(dir.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "settings:updated");
        assert!(lines[0]["timestamp"].is_string());
        assert_eq!(lines[1]["payload"]["notifications"], true);
    }

    #[test]
    fn test_no_log_without_subscription() {
        let dir = TempDir::new().unwrap();
        EventBus::new().publish(&Event::SettingsUpdated(Settings::default()));
        assert!(read_log_lines(dir.path()).is_empty());
    }

    #[test]
    fn test_write_failure_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be.
        std::fs::create_dir(log_path(dir.path())).unwrap();
        let bus = EventBus::new();
        attach(&bus, dir.path());

        let report = bus.publish(&Event::SettingsUpdated(Settings::default()));
        assert_eq!(report.failed.len(), 1);
    }
}
