//! Path utilities for determining data storage locations.
//!
//! Data lives in one directory: `$TASKDECK_HOME` when set, otherwise
//! `<platform data dir>/taskdeck`, falling back to `./.taskdeck` when the
//! platform has no data directory.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "TASKDECK_HOME";

/// The directory name used under the platform data directory.
const DATA_DIR_NAME: &str = "taskdeck";

/// The `SQLite` database filename.
pub const DATABASE_FILENAME: &str = "taskdeck.sqlite3";

/// Directory holding the file-backed fallback store.
pub const FILE_STORE_DIRNAME: &str = "store";

/// Directory holding cached asset buckets.
pub const CACHE_DIRNAME: &str = "cache";

/// Directory that exports are written to by default.
pub const EXPORT_DIRNAME: &str = "exports";

/// Get the data directory, honouring [`HOME_ENV`].
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir().map_or_else(|| PathBuf::from(".taskdeck"), |d| d.join(DATA_DIR_NAME))
}

/// Path of the `SQLite` database inside a data directory.
#[must_use]
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}

/// Directory of the file-backed store inside a data directory.
#[must_use]
pub fn file_store_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(FILE_STORE_DIRNAME)
}

/// Directory of cached asset buckets inside a data directory.
#[must_use]
pub fn cache_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(CACHE_DIRNAME)
}

/// Default export directory inside a data directory.
#[must_use]
pub fn export_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(EXPORT_DIRNAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_data_dir_honours_env() {
        std::env::set_var(HOME_ENV, "/tmp/taskdeck-test-home");
        assert_eq!(data_dir(), PathBuf::from("/tmp/taskdeck-test-home"));
        std::env::remove_var(HOME_ENV);
    }

    #[test]
    #[serial]
    fn test_data_dir_default_ends_with_name() {
        std::env::remove_var(HOME_ENV);
        let dir = data_dir();
        let name = dir.file_name().unwrap().to_string_lossy();
        assert!(name == "taskdeck" || name == ".taskdeck");
    }

    #[test]
    fn test_layout_is_under_data_dir() {
        let base = Path::new("/data");
        assert_eq!(database_path(base), PathBuf::from("/data/taskdeck.sqlite3"));
        assert_eq!(file_store_dir(base), PathBuf::from("/data/store"));
        assert_eq!(cache_dir(base), PathBuf::from("/data/cache"));
        assert_eq!(export_dir(base), PathBuf::from("/data/exports"));
    }
}
