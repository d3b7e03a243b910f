//! Hierarchical CLI for taskdeck.
//!
//! This module provides the command-line interface with two-level commands
//! for managing tasks, projects, settings and the offline asset cache.

mod cache;
mod project;
mod run;
mod settings;
mod task;


pub use cache::CacheCommand;
pub use project::ProjectCommand;
pub use run::{run, CliOutput};
pub use settings::SettingsCommand;
pub use task::TaskCommand;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// taskdeck - an offline-first task list.
///
/// For detailed help on any command group, use:
///   taskdeck <command> --help
///
/// Data lives in `--data-dir`, `$TASKDECK_HOME`, or the platform data
/// directory, in that order.
#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory override
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Task management - add, edit, complete, move and delete tasks.
    #[command(subcommand)]
    Task(TaskCommand),

    /// Project management - group tasks and choose list or kanban layout.
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Show a view: inbox, today, week, month, projects or all.
    ///
    /// With `--project`, shows that project as a list or a board depending
    /// on its layout. Unknown view names show every task.
    View {
        /// View name
        #[arg(default_value = "inbox")]
        name: String,

        /// Project ID or name
        #[arg(short, long)]
        project: Option<String>,

        /// Emit HTML instead of text
        #[arg(long)]
        html: bool,
    },

    /// Search titles, descriptions and tags.
    Search {
        /// Text to look for
        query: String,

        /// Emit HTML instead of text
        #[arg(long)]
        html: bool,
    },

    /// Show the pending-task count beside each view.
    Counts,

    /// Export everything as JSON or CSV.
    Export {
        /// Output format: json or csv
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Directory to write into (default: <data-dir>/exports)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Settings - dark mode and notifications.
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Offline asset cache - install, activate, inspect.
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Report where data lives and whether it loads.
    Doctor,

    // === Utility Commands ===
    /// Show version information.
    Version,
}
