//! Project CLI subcommands.

use clap::Subcommand;

/// Project management commands.
///
/// Projects can be referenced by ID or, case-insensitively, by name.
#[derive(Subcommand, Debug, Clone)]
pub enum ProjectCommand {
    /// Create a project.
    Add {
        /// Name (required)
        name: String,

        /// Color as #rgb or #rrggbb
        #[arg(short, long)]
        color: Option<String>,

        /// Layout: list or kanban
        #[arg(short, long, default_value = "list")]
        view: String,
    },

    /// List projects with their task counts.
    List,

    /// Change a project's fields.
    Edit {
        /// Project ID or name
        project: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New color
        #[arg(short, long)]
        color: Option<String>,

        /// New layout: list or kanban
        #[arg(short, long)]
        view: Option<String>,
    },

    /// Delete a project. Its tasks move back to the inbox.
    Delete {
        /// Project ID or name
        project: String,
    },
}
