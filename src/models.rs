//! Data model: tasks, projects, settings and the persisted document.
//!
//! Field names serialize in camelCase so a stored document keeps the same
//! shape whichever backend holds it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Kanban column a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Not started.
    #[default]
    Todo,
    /// In progress.
    Doing,
    /// Finished.
    Done,
}

impl WorkflowStatus {
    /// All statuses in column order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::Doing, Self::Done];

    /// Parse a status from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid status.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, InvalidStatus> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "doing" => Ok(Self::Doing),
            "done" => Ok(Self::Done),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }

    /// Get the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Doing => "doing",
            Self::Done => "done",
        }
    }

    /// Human-readable column title.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::Doing => "Doing",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid status string is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatus(pub String);

impl std::fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid status: '{}' (must be one of: todo, doing, done)", self.0)
    }
}

impl std::error::Error for InvalidStatus {}

/// A checklist item inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Unique identifier.
    pub id: String,
    /// Checklist text.
    pub text: String,
    /// Whether the item is checked off.
    #[serde(default)]
    pub done: bool,
}

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier.
    pub id: String,
    /// Title, never empty.
    pub title: String,
    /// Free-form notes.
    #[serde(default)]
    pub description: String,
    /// Owning project, if any. Not enforced against the project list.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Calendar day the task is due. Timestamps keep only their day and
    /// unreadable values load as no due date.
    #[serde(default, deserialize_with = "optional_date")]
    pub due_date: Option<NaiveDate>,
    /// Tags in insertion order; duplicates allowed.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Checklist items in display order.
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Completion flag.
    #[serde(default)]
    pub done: bool,
    /// Recurrence marker. Stored only.
    #[serde(default)]
    pub recurring: bool,
    /// When the task was created. Absent in documents from clients that
    /// never recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Kanban column.
    #[serde(default)]
    pub status: WorkflowStatus,
    /// Fields this crate does not know about, kept so saving does not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Whether the task counts as finished.
    ///
    /// Either the completion flag or the `done` column is enough; documents
    /// written by older clients may set only one of them.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.done || self.status == WorkflowStatus::Done
    }

    /// Number of checked subtasks and the total.
    #[must_use]
    pub fn subtask_progress(&self) -> (usize, usize) {
        (self.subtasks.iter().filter(|s| s.done).count(), self.subtasks.len())
    }
}

/// How a project's tasks are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Flat list.
    #[default]
    List,
    /// Three-column board.
    Kanban,
}

impl ViewMode {
    /// Parse a view mode, accepting `list` or `kanban`.
    ///
    /// # Errors
    ///
    /// Returns the rejected input when it names neither mode.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "list" => Ok(Self::List),
            "kanban" => Ok(Self::Kanban),
            _ => Err(format!("invalid view mode: '{s}' (must be list or kanban)")),
        }
    }

    /// Display label shown on project cards.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Kanban => "Kanban",
        }
    }
}

/// Default color for new projects.
pub const DEFAULT_PROJECT_COLOR: &str = "#4a90d9";

fn default_color() -> String {
    DEFAULT_PROJECT_COLOR.to_string()
}

/// A named group of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier.
    pub id: String,
    /// Display name, never empty.
    pub name: String,
    /// Display color hint, usually a CSS hex color.
    #[serde(default = "default_color")]
    pub color: String,
    /// Preferred layout.
    #[serde(default)]
    pub view: ViewMode,
    /// Unrecognized fields, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
    /// Follow the host.
    #[default]
    Auto,
    /// Always light.
    Light,
    /// Always dark.
    Dark,
}

impl DarkMode {
    /// Parse a theme preference.
    ///
    /// # Errors
    ///
    /// Returns a message when the input is not `auto`, `light` or `dark`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(format!("invalid dark mode: '{s}' (must be auto, light or dark)")),
        }
    }

    /// Get the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

const fn default_true() -> bool {
    true
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Theme preference.
    #[serde(default)]
    pub dark_mode: DarkMode,
    /// Reminder notifications. Stored only.
    #[serde(default = "default_true")]
    pub notifications: bool,
    /// Unrecognized preferences.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self { dark_mode: DarkMode::Auto, notifications: true, extra: Map::new() }
    }
}

/// The persisted aggregate. Every save writes all of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// All tasks.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// All projects.
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Preferences.
    #[serde(default)]
    pub settings: Settings,
    /// Unrecognized top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Look up a project by id.
    #[must_use]
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}

/// Accept `null`, a missing field, an empty string or `YYYY-MM-DD`.
///
/// Anything else that does not start with a valid day loads as `None` so one
/// bad task cannot take the rest of the document with it.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    let text = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(other) => {
            tracing::warn!(due_date = %other, "ignoring non-string due date");
            return Ok(None);
        }
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    // Browsers sometimes store a full timestamp; only the day matters.
    let day = trimmed.get(..10).unwrap_or(trimmed);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => Ok(Some(date)),
        Err(e) => {
            tracing::warn!(due_date = %trimmed, error = %e, "ignoring unreadable due date");
            Ok(None)
        }
    }
}
