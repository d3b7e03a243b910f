//! View-models for the three screens.
//!
//! The functions here are pure: they take entity slices and the current day
//! and return plain serializable structs. [`html`] and [`text`] turn those
//! structs into markup or terminal output.

pub mod html;
pub mod text;

use crate::models::{Project, Task, ViewMode, WorkflowStatus, DEFAULT_PROJECT_COLOR};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

/// Project name and color shown on a task card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectBadge {
    /// Project id.
    pub id: String,
    /// Project name.
    pub name: String,
    /// Sanitized color.
    pub color: String,
}

/// One task as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCard {
    /// Task id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Notes.
    pub description: String,
    /// Owning project, if it still exists.
    pub project: Option<ProjectBadge>,
    /// Due day.
    pub due_date: Option<NaiveDate>,
    /// Relative due label such as `Today` or `Mar 4`.
    pub due_label: Option<String>,
    /// Due before today and not complete.
    pub overdue: bool,
    /// Tags.
    pub tags: Vec<String>,
    /// Checked subtasks.
    pub subtasks_done: usize,
    /// All subtasks.
    pub subtasks_total: usize,
    /// Either completion signal is set.
    pub complete: bool,
    /// Kanban column.
    pub status: WorkflowStatus,
    /// Recurrence marker.
    pub recurring: bool,
}

/// Placeholder shown when a screen has nothing to list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyState {
    /// Headline.
    pub title: String,
    /// Hint.
    pub message: String,
}

/// A flat list of task cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskListView {
    /// Screen heading.
    pub heading: String,
    /// Cards in display order.
    pub cards: Vec<TaskCard>,
    /// Set when `cards` is empty.
    pub empty: Option<EmptyState>,
}

/// One kanban column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanColumn {
    /// Column status.
    pub status: WorkflowStatus,
    /// Column title.
    pub title: String,
    /// Cards in the column.
    pub cards: Vec<TaskCard>,
}

/// A three-column board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanBoard {
    /// Screen heading.
    pub heading: String,
    /// Always `todo`, `doing`, `done`, in that order.
    pub columns: Vec<KanbanColumn>,
}

impl KanbanBoard {
    /// The column for a status.
    #[must_use]
    pub fn column(&self, status: WorkflowStatus) -> Option<&KanbanColumn> {
        self.columns.iter().find(|c| c.status == status)
    }
}

/// One project as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCard {
    /// Project id.
    pub id: String,
    /// Name.
    pub name: String,
    /// Sanitized color.
    pub color: String,
    /// Tasks referencing the project.
    pub task_count: usize,
    /// Layout.
    pub view: ViewMode,
    /// Layout label.
    pub view_label: String,
}

/// The project overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectListView {
    /// Cards in creation order.
    pub cards: Vec<ProjectCard>,
    /// Set when there are no projects.
    pub empty: Option<EmptyState>,
}

/// Return `color` if it is a hex color, otherwise the default.
///
/// Colors end up inside `style` attributes, where HTML escaping is not
/// enough.
#[must_use]
pub fn safe_color(color: &str) -> String {
    let color = color.trim();
    if HEX_COLOR.is_match(color) {
        color.to_string()
    } else {
        DEFAULT_PROJECT_COLOR.to_string()
    }
}

/// Human label for a due day relative to `today`.
#[must_use]
pub fn due_label(due: NaiveDate, today: NaiveDate) -> String {
    match (due - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ if due.year() == today.year() => due.format("%b %-d").to_string(),
        _ => due.format("%b %-d, %Y").to_string(),
    }
}

/// Build the card for one task.
#[must_use]
pub fn task_card(task: &Task, projects: &[Project], today: NaiveDate) -> TaskCard {
    let project = task
        .project_id
        .as_deref()
        .and_then(|pid| projects.iter().find(|p| p.id == pid))
        .map(|p| ProjectBadge { id: p.id.clone(), name: p.name.clone(), color: safe_color(&p.color) });
    let complete = task.is_complete();
    let (subtasks_done, subtasks_total) = task.subtask_progress();
    TaskCard {
        id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone(),
        project,
        due_date: task.due_date,
        due_label: task.due_date.map(|d| due_label(d, today)),
        overdue: !complete && task.due_date.is_some_and(|d| d < today),
        tags: task.tags.clone(),
        subtasks_done,
        subtasks_total,
        complete,
        status: task.status,
        recurring: task.recurring,
    }
}

/// A flat list, in the order given.
#[must_use]
pub fn task_list(heading: &str, tasks: &[Task], projects: &[Project], today: NaiveDate) -> TaskListView {
    let cards: Vec<TaskCard> = tasks.iter().map(|t| task_card(t, projects, today)).collect();
    let empty = cards.is_empty().then(|| EmptyState {
        title: "No tasks".to_string(),
        message: "Nothing here yet. Add a task to get started.".to_string(),
    });
    TaskListView { heading: heading.to_string(), cards, empty }
}

/// Column a task is placed in. Complete tasks always land in `done`.
#[must_use]
pub fn kanban_column_of(task: &Task) -> WorkflowStatus {
    if task.is_complete() {
        WorkflowStatus::Done
    } else {
        task.status
    }
}

/// A board with the three fixed columns.
#[must_use]
pub fn kanban(heading: &str, tasks: &[Task], projects: &[Project], today: NaiveDate) -> KanbanBoard {
    let columns = WorkflowStatus::ALL
        .iter()
        .map(|&status| KanbanColumn {
            status,
            title: status.label().to_string(),
            cards: tasks
                .iter()
                .filter(|t| kanban_column_of(t) == status)
                .map(|t| task_card(t, projects, today))
                .collect(),
        })
        .collect();
    KanbanBoard { heading: heading.to_string(), columns }
}

/// The project overview with per-project task counts.
#[must_use]
pub fn project_list(projects: &[Project], tasks: &[Task]) -> ProjectListView {
    let cards: Vec<ProjectCard> = projects
        .iter()
        .map(|p| ProjectCard {
            id: p.id.clone(),
            name: p.name.clone(),
            color: safe_color(&p.color),
            task_count: tasks.iter().filter(|t| t.project_id.as_deref() == Some(p.id.as_str())).count(),
            view: p.view,
            view_label: p.view.label().to_string(),
        })
        .collect();
    let empty = cards.is_empty().then(|| EmptyState {
        title: "No projects".to_string(),
        message: "Create a project to group related tasks.".to_string(),
    });
    ProjectListView { cards, empty }
}
