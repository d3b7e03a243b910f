//! Task CLI subcommands.

use clap::Subcommand;

/// Task management commands.
///
/// ## Quick Start
///
/// ```bash
/// # Capture something into the inbox
/// taskdeck task add "Buy milk"
///
/// # Schedule it and file it under a project
/// taskdeck task edit <id> --due tomorrow --project Home
///
/// # Tick it off
/// taskdeck task done <id>
/// ```
#[derive(Subcommand, Debug, Clone)]
pub enum TaskCommand {
    /// Add a task. Without a project it lands in the inbox.
    Add {
        /// Title (required)
        title: String,

        /// Notes
        #[arg(short, long, default_value = "")]
        description: String,

        /// Project ID or name
        #[arg(short, long)]
        project: Option<String>,

        /// Due date: YYYY-MM-DD, today or tomorrow
        #[arg(long)]
        due: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Checklist item (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,

        /// Kanban column: todo, doing or done
        #[arg(short, long)]
        status: Option<String>,

        /// Mark as recurring
        #[arg(long)]
        recurring: bool,
    },

    /// Show a task as JSON.
    Get {
        /// Task ID
        id: String,
    },

    /// Change a task's fields. Only the given fields change.
    Edit {
        /// Task ID
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New notes
        #[arg(short, long)]
        description: Option<String>,

        /// Move to a project (ID or name)
        #[arg(short, long, conflicts_with = "no_project")]
        project: Option<String>,

        /// Move back to the inbox
        #[arg(long)]
        no_project: bool,

        /// New due date: YYYY-MM-DD, today or tomorrow
        #[arg(long, conflicts_with = "no_due")]
        due: Option<String>,

        /// Clear the due date
        #[arg(long)]
        no_due: bool,

        /// Recurring: true or false
        #[arg(long)]
        recurring: Option<bool>,
    },

    /// Toggle completion.
    Done {
        /// Task ID
        id: String,
    },

    /// Move a task to a kanban column.
    Move {
        /// Task ID
        id: String,

        /// Column: todo, doing or done
        status: String,
    },

    /// Delete a task.
    Delete {
        /// Task ID
        id: String,
    },

    /// Add a tag.
    Tag {
        /// Task ID
        id: String,

        /// Tag text
        tag: String,
    },

    /// Remove a tag.
    Untag {
        /// Task ID
        id: String,

        /// Tag text
        tag: String,
    },

    /// Add a checklist item.
    #[command(name = "subtask-add")]
    SubtaskAdd {
        /// Task ID
        id: String,

        /// Item text
        text: String,
    },

    /// Toggle a checklist item.
    #[command(name = "subtask-done")]
    SubtaskDone {
        /// Task ID
        id: String,

        /// Subtask ID
        subtask_id: String,
    },

    /// Remove a checklist item.
    #[command(name = "subtask-remove")]
    SubtaskRemove {
        /// Task ID
        id: String,

        /// Subtask ID
        subtask_id: String,
    },
}
