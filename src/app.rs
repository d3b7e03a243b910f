//! Composition root: builds the gateway, bus, managers and navigator for a
//! data directory and wires them together.

use crate::config::{AppConfig, StorageKind};
use crate::error::Result;
use crate::event_log;
use crate::events::EventBus;
use crate::export::{self, ExportFormat};
use crate::models::Document;
use crate::nav::Navigator;
use crate::offline::{CacheWorker, DirCacheStorage, StaticDirFetcher};
use crate::paths;
use crate::projects::ProjectManager;
use crate::render::html::HtmlRenderer;
use crate::settings::SettingsManager;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, SqliteStore, StorageGateway};
use crate::tasks::TaskManager;
use crate::traits::{Clock, SystemClock};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One fully wired application instance.
#[derive(Debug)]
pub struct App {
    data_dir: PathBuf,
    config: AppConfig,
    gateway: Rc<StorageGateway>,
    bus: Rc<EventBus>,
    tasks: Rc<TaskManager>,
    projects: Rc<ProjectManager>,
    settings: SettingsManager,
    navigator: Navigator,
}

impl App {
    /// Open the data directory with its config (written with defaults if
    /// absent) and the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or written.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = AppConfig::ensure(data_dir)?;
        Ok(Self::open_with(data_dir, config, Rc::new(SystemClock)))
    }

    /// Open with an explicit config and clock.
    pub fn open_with(data_dir: &Path, config: AppConfig, clock: Rc<dyn Clock>) -> Self {
        let gateway = Rc::new(open_gateway(data_dir, config.storage));
        let bus = Rc::new(EventBus::new());
        if config.event_log {
            event_log::attach(&bus, data_dir);
        }

        let tasks = Rc::new(TaskManager::new(Rc::clone(&gateway), Rc::clone(&bus), clock));
        let projects =
            Rc::new(ProjectManager::new(Rc::clone(&gateway), Rc::clone(&bus), Rc::clone(&tasks)));
        let settings = SettingsManager::new(Rc::clone(&gateway), Rc::clone(&bus));
        let navigator = Navigator::new(Rc::clone(&tasks), Rc::clone(&projects), Rc::clone(&bus));

        Self {
            data_dir: data_dir.to_path_buf(),
            config,
            gateway,
            bus,
            tasks,
            projects,
            settings,
            navigator,
        }
    }

    /// The data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The active config.
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The storage gateway.
    pub fn gateway(&self) -> &StorageGateway {
        &self.gateway
    }

    /// The event bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Task operations.
    pub fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    /// Project operations.
    pub fn projects(&self) -> &ProjectManager {
        &self.projects
    }

    /// Settings operations.
    pub const fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    /// Navigation state.
    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// The persisted document as it is now.
    pub fn document(&self) -> Document {
        self.gateway.load()
    }

    /// Export into `<data_dir>/exports`, or `out_dir` if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn export(&self, format: ExportFormat, out_dir: Option<&Path>) -> Result<PathBuf> {
        let dir = out_dir.map_or_else(|| paths::export_dir(&self.data_dir), Path::to_path_buf);
        export::export_to_dir(&self.document(), &dir, format, self.tasks.clock().today())
    }

    /// An HTML renderer honouring the configured theme directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a theme template fails to parse.
    pub fn renderer(&self) -> Result<HtmlRenderer> {
        HtmlRenderer::with_theme_dir(self.config.theme_dir.as_deref())
    }

    /// A cache worker over `<data_dir>/cache` serving the configured assets.
    pub fn cache_worker(&self) -> CacheWorker {
        CacheWorker::new(
            self.config.cache_version,
            self.config.origin.clone(),
            Box::new(DirCacheStorage::new(paths::cache_dir(&self.data_dir))),
            Box::new(StaticDirFetcher::new(
                self.config.origin.clone(),
                self.config.asset_dir_in(&self.data_dir),
            )),
        )
    }
}

/// Pick the backend once, at startup.
fn open_gateway(data_dir: &Path, kind: StorageKind) -> StorageGateway {
    match kind {
        StorageKind::Sqlite => {
            let files = paths::file_store_dir(data_dir);
            StorageGateway::open(
                Box::new(SqliteStore::new(paths::database_path(data_dir))),
                move || -> Box<dyn KeyValueStore> { Box::new(FileStore::new(files)) },
            )
        }
        StorageKind::File => StorageGateway::open(
            Box::new(FileStore::new(paths::file_store_dir(data_dir))),
            || -> Box<dyn KeyValueStore> { Box::new(MemoryStore::new()) },
        ),
        StorageKind::Memory => StorageGateway::with_store(Box::new(MemoryStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::NewTask;
    use crate::traits::FixedClock;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn clock() -> Rc<dyn Clock> {
        Rc::new(FixedClock::on(NaiveDate::from_ymd_opt(2026, 4, 2).unwrap()))
    }

    #[test]
    fn test_open_writes_default_config() {
        let dir = TempDir::new().unwrap();
        let app = App::open(dir.path()).unwrap();
        assert!(AppConfig::config_path(dir.path()).exists());
        assert_eq!(app.gateway().backend_name(), "sqlite");
    }

    #[test]
    fn test_each_storage_kind() {
        let dir = TempDir::new().unwrap();
        for (kind, name) in
            [(StorageKind::Sqlite, "sqlite"), (StorageKind::File, "file"), (StorageKind::Memory, "memory")]
        {
            let config = AppConfig { storage: kind, ..AppConfig::default() };
            let app = App::open_with(dir.path(), config, clock());
            assert_eq!(app.gateway().backend_name(), name);
        }
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::default();
        {
            let app = App::open_with(dir.path(), config.clone(), clock());
            app.tasks().create(NewTask::titled("Persist me")).unwrap();
        }
        let app = App::open_with(dir.path(), config, clock());
        assert_eq!(app.tasks().list()[0].title, "Persist me");
    }

    #[test]
    fn test_event_log_enabled_by_config() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig { event_log: true, ..AppConfig::default() };
        let app = App::open_with(dir.path(), config, clock());
        app.tasks().create(NewTask::titled("Logged")).unwrap();

        let log = std::fs::read_to_string(event_log::log_path(dir.path())).unwrap();
        assert!(log.contains("task:created"));
    }

    #[test]
    fn test_export_uses_clock_date() {
        let dir = TempDir::new().unwrap();
        let app = App::open_with(dir.path(), AppConfig::default(), clock());
        let path = app.export(ExportFormat::Json, None).unwrap();
        assert_eq!(path, paths::export_dir(dir.path()).join("taskdeck-export-2026-04-02.json"));
    }

    #[test]
    fn test_cache_worker_uses_config_version() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig { cache_version: 7, ..AppConfig::default() };
        let app = App::open_with(dir.path(), config, clock());
        assert_eq!(app.cache_worker().bucket(), "taskdeck-v7");
    }
}
