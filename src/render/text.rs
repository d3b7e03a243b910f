//! Plain-text adapter for terminal output.

use super::{KanbanBoard, ProjectListView, TaskCard, TaskListView};
use std::fmt::Write as _;

/// One line per task: checkbox, title, then metadata.
#[must_use]
pub fn task_line(card: &TaskCard) -> String {
    let mut line = format!("[{}] {}", if card.complete { 'x' } else { ' ' }, card.title);
    if let Some(label) = &card.due_label {
        let _ = write!(line, "  due {label}");
        if card.overdue {
            line.push_str(" (overdue)");
        }
    }
    if let Some(project) = &card.project {
        let _ = write!(line, "  @{}", project.name);
    }
    for tag in &card.tags {
        let _ = write!(line, " #{tag}");
    }
    if card.subtasks_total > 0 {
        let _ = write!(line, "  {}/{}", card.subtasks_done, card.subtasks_total);
    }
    let _ = write!(line, "  <{}>", card.id);
    line
}

/// Render a task list.
#[must_use]
pub fn task_list(view: &TaskListView) -> String {
    let mut out = format!("{}\n", view.heading);
    if let Some(empty) = &view.empty {
        let _ = writeln!(out, "  {}", empty.message);
        return out;
    }
    for card in &view.cards {
        let _ = writeln!(out, "  {}", task_line(card));
    }
    out
}

/// Render a board as three stacked sections.
#[must_use]
pub fn kanban(board: &KanbanBoard) -> String {
    let mut out = format!("{}\n", board.heading);
    for column in &board.columns {
        let _ = writeln!(out, "== {} ({})", column.title, column.cards.len());
        for card in &column.cards {
            let _ = writeln!(out, "  {}", task_line(card));
        }
    }
    out
}

/// Render the project overview.
#[must_use]
pub fn projects(view: &ProjectListView) -> String {
    let mut out = String::from("Projects\n");
    if let Some(empty) = &view.empty {
        let _ = writeln!(out, "  {}", empty.message);
        return out;
    }
    for card in &view.cards {
        let _ = writeln!(
            out,
            "  {} ({} task{}, {})  <{}>",
            card.name,
            card.task_count,
            if card.task_count == 1 { "" } else { "s" },
            card.view_label,
            card.id
        );
    }
    out
}
