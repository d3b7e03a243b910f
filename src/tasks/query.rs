//! Pure filtering, ordering and search over task slices.

use crate::models::Task;
use crate::view::View;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Whether `task` belongs in the named view on `today`.
#[must_use]
pub fn matches_view(task: &Task, view: View, today: NaiveDate) -> bool {
    match view {
        View::Inbox => task.project_id.is_none(),
        View::Today | View::Week | View::Month => {
            match (task.due_date, view.date_window(today)) {
                (Some(due), Some((start, end))) => due >= start && due <= end,
                _ => false,
            }
        }
        View::Projects | View::All => true,
    }
}

/// Display order: incomplete first, then by due date with undated tasks
/// last, undated ties newest first.
#[must_use]
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.is_complete().cmp(&b.is_complete()).then_with(|| match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at),
    })
}

/// Sort tasks into display order. The sort is stable.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(compare_tasks);
}

/// Select and order tasks for a view.
///
/// A project id overrides the view: every task in that project is returned.
#[must_use]
pub fn filter_tasks(
    tasks: &[Task],
    view: View,
    project_id: Option<&str>,
    today: NaiveDate,
) -> Vec<Task> {
    let mut selected: Vec<Task> = tasks
        .iter()
        .filter(|t| match project_id {
            Some(pid) => t.project_id.as_deref() == Some(pid),
            None => matches_view(t, view, today),
        })
        .cloned()
        .collect();
    sort_tasks(&mut selected);
    selected
}

/// Case-insensitive substring search over title, description and tags.
///
/// A blank query returns every task in stored order. Otherwise the query is
/// matched as typed, surrounding whitespace included.
#[must_use]
pub fn search_tasks(tasks: &[Task], query: &str) -> Vec<Task> {
    if query.trim().is_empty() {
        return tasks.to_vec();
    }
    let needle = query.to_lowercase();
    tasks
        .iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&needle)
                || t.description.to_lowercase().contains(&needle)
                || t.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Number of incomplete tasks in a view.
#[must_use]
pub fn pending_in_view(tasks: &[Task], view: View, today: NaiveDate) -> usize {
    tasks.iter().filter(|t| !t.is_complete() && matches_view(t, view, today)).count()
}
