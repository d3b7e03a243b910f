//! Error types for `taskdeck`.

use std::path::PathBuf;

/// Errors that can occur while managing tasks, projects and the asset cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),

    /// Input failed validation (for example an empty title).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// A referenced project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// A referenced subtask does not exist on its task.
    #[error("subtask {subtask_id} not found on task {task_id}")]
    SubtaskNotFound {
        /// The task that was searched.
        task_id: String,
        /// The missing subtask.
        subtask_id: String,
    },

    /// The host lacks a capability the operation needs.
    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// The cache worker was asked to do something its current phase forbids.
    #[error("cache worker cannot {action} while {phase}")]
    WorkerPhase {
        /// The requested step.
        action: &'static str,
        /// The phase the worker was in.
        phase: &'static str,
    },

    /// A configuration file is present but unusable.
    #[error("Config error in {path}: {message}")]
    Config {
        /// The offending file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },
}

impl From<tera::Error> for Error {
    fn from(err: tera::Error) -> Self {
        // Tera nests the useful message in the source chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Template(message)
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
