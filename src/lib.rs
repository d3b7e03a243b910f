//! # `taskdeck`
//!
//! An offline-first GTD task list: tasks with due dates, tags and
//! checklists; projects shown as lists or kanban boards; date-based views;
//! JSON/CSV export; and a versioned asset cache for running without a
//! network.
//!
//! [`app::App`] wires everything together for a data directory. Each piece
//! can also be constructed on its own, which is how the tests use them.

pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod event_log;
pub mod events;
pub mod export;
pub mod id;
pub mod logging;
pub mod models;
pub mod nav;
pub mod offline;
pub mod paths;
pub mod projects;
pub mod render;
pub mod settings;
pub mod storage;
pub mod tasks;
pub mod traits;
pub mod view;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
