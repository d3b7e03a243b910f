//! The task collection and its mutations.

use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::id::{generate_id, SUBTASK_PREFIX, TASK_PREFIX};
use crate::models::{Subtask, Task, WorkflowStatus};
use crate::storage::StorageGateway;
use crate::tasks::query;
use crate::traits::Clock;
use crate::view::View;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::rc::Rc;

/// Fields for a new task.
#[derive(Debug, Default, Clone)]
pub struct NewTask {
    /// Title (required, trimmed).
    pub title: String,
    /// Notes.
    pub description: String,
    /// Owning project.
    pub project_id: Option<String>,
    /// Due day.
    pub due_date: Option<NaiveDate>,
    /// Tags.
    pub tags: Vec<String>,
    /// Checklist item texts.
    pub subtasks: Vec<String>,
    /// Recurrence marker.
    pub recurring: bool,
    /// Starting column; `todo` if unset.
    pub status: Option<WorkflowStatus>,
}

impl NewTask {
    /// A new task with only a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }
}

/// Fields that can be updated on a task. `None` leaves a field unchanged.
#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    /// New title (if Some).
    pub title: Option<String>,
    /// New description (if Some).
    pub description: Option<String>,
    /// New project; `Some(None)` clears it.
    pub project_id: Option<Option<String>>,
    /// New due day; `Some(None)` clears it.
    pub due_date: Option<Option<NaiveDate>>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// New completion flag.
    pub done: Option<bool>,
    /// New recurrence marker.
    pub recurring: Option<bool>,
    /// New column.
    pub status: Option<WorkflowStatus>,
}

impl TaskPatch {
    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.project_id.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
            && self.done.is_none()
            && self.recurring.is_none()
            && self.status.is_none()
    }

    /// Merge the set fields into `task`.
    ///
    /// `done` and `status` are kept in agreement: setting one updates the
    /// other, and when both are given `status` wins.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the new title is blank.
    pub fn apply(self, task: &mut Task) -> Result<()> {
        if let Some(title) = self.title {
            task.title = validate_title(&title)?;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(project_id) = self.project_id {
            task.project_id = project_id;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(recurring) = self.recurring {
            task.recurring = recurring;
        }
        match (self.done, self.status) {
            (_, Some(status)) => set_status(task, status),
            (Some(done), None) => set_done(task, done),
            (None, None) => {}
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("task title must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn set_status(task: &mut Task, status: WorkflowStatus) {
    task.status = status;
    task.done = status == WorkflowStatus::Done;
}

fn set_done(task: &mut Task, done: bool) {
    task.done = done;
    if done {
        task.status = WorkflowStatus::Done;
    } else if task.status == WorkflowStatus::Done {
        task.status = WorkflowStatus::Todo;
    }
}

/// In-memory task collection persisted through the storage gateway.
pub struct TaskManager {
    gateway: Rc<StorageGateway>,
    bus: Rc<EventBus>,
    clock: Rc<dyn Clock>,
    tasks: RefCell<Vec<Task>>,
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager").field("tasks", &self.tasks.borrow().len()).finish()
    }
}

impl TaskManager {
    /// Load the task collection from the gateway.
    pub fn new(gateway: Rc<StorageGateway>, bus: Rc<EventBus>, clock: Rc<dyn Clock>) -> Self {
        let tasks = gateway.load().tasks;
        Self { gateway, bus, clock, tasks: RefCell::new(tasks) }
    }

    /// Re-read the collection from storage, discarding in-memory state.
    pub fn reload(&self) {
        *self.tasks.borrow_mut() = self.gateway.load().tasks;
    }

    /// The clock used for date-based views.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Create a task.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the title is blank.
    pub fn create(&self, fields: NewTask) -> Result<Task> {
        let title = validate_title(&fields.title)?;
        let mut task = Task {
            id: generate_id(TASK_PREFIX),
            title,
            description: fields.description,
            project_id: fields.project_id,
            due_date: fields.due_date,
            tags: fields.tags,
            subtasks: fields
                .subtasks
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .map(|text| Subtask { id: generate_id(SUBTASK_PREFIX), text, done: false })
                .collect(),
            done: false,
            recurring: fields.recurring,
            created_at: Some(self.clock.now()),
            status: WorkflowStatus::Todo,
            extra: serde_json::Map::new(),
        };
        if let Some(status) = fields.status {
            set_status(&mut task, status);
        }

        self.tasks.borrow_mut().push(task.clone());
        self.persist();
        tracing::debug!(id = %task.id, "task created");
        self.bus.publish(&Event::TaskCreated(task.clone()));
        Ok(task)
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<Task> {
        self.tasks.borrow().iter().find(|t| t.id == id).cloned()
    }

    /// All tasks in stored order.
    pub fn list(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    /// Merge `patch` into a task.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` for an unknown id or `Error::Validation`
    /// for a blank title.
    pub fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.modify(id, |task| patch.apply(task))
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` for an unknown id.
    pub fn delete(&self, id: &str) -> Result<Task> {
        let removed = {
            let mut tasks = self.tasks.borrow_mut();
            let index = tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            tasks.remove(index)
        };
        self.persist();
        tracing::debug!(id, "task deleted");
        self.bus.publish(&Event::TaskDeleted(removed.clone()));
        Ok(removed)
    }

    /// Flip a task between complete and not complete.
    ///
    /// Completing moves it to the `done` column; reopening moves it to `todo`.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` for an unknown id.
    pub fn toggle_done(&self, id: &str) -> Result<Task> {
        self.modify(id, |task| {
            let complete = !task.is_complete();
            task.done = complete;
            task.status = if complete { WorkflowStatus::Done } else { WorkflowStatus::Todo };
            Ok(())
        })
    }

    /// Move a task to a kanban column, keeping `done` in step.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` for an unknown id.
    pub fn move_task(&self, id: &str, status: WorkflowStatus) -> Result<Task> {
        self.modify(id, |task| {
            set_status(task, status);
            Ok(())
        })
    }

    /// Append a checklist item.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` for an unknown task or
    /// `Error::Validation` for blank text.
    pub fn add_subtask(&self, id: &str, text: &str) -> Result<Task> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("subtask text must not be empty".to_string()));
        }
        self.modify(id, |task| {
            task.subtasks.push(Subtask {
                id: generate_id(SUBTASK_PREFIX),
                text: text.to_string(),
                done: false,
            });
            Ok(())
        })
    }

    /// Check or uncheck a checklist item.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` or `Error::SubtaskNotFound`.
    pub fn toggle_subtask(&self, id: &str, subtask_id: &str) -> Result<Task> {
        self.modify(id, |task| {
            let subtask = task.subtasks.iter_mut().find(|s| s.id == subtask_id).ok_or_else(|| {
                Error::SubtaskNotFound { task_id: id.to_string(), subtask_id: subtask_id.to_string() }
            })?;
            subtask.done = !subtask.done;
            Ok(())
        })
    }

    /// Remove a checklist item.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` or `Error::SubtaskNotFound`.
    pub fn remove_subtask(&self, id: &str, subtask_id: &str) -> Result<Task> {
        self.modify(id, |task| {
            let before = task.subtasks.len();
            task.subtasks.retain(|s| s.id != subtask_id);
            if task.subtasks.len() == before {
                return Err(Error::SubtaskNotFound {
                    task_id: id.to_string(),
                    subtask_id: subtask_id.to_string(),
                });
            }
            Ok(())
        })
    }

    /// Append a tag. Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` for an unknown task or
    /// `Error::Validation` for a blank tag.
    pub fn add_tag(&self, id: &str, tag: &str) -> Result<Task> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::Validation("tag must not be empty".to_string()));
        }
        self.modify(id, |task| {
            task.tags.push(tag.to_string());
            Ok(())
        })
    }

    /// Remove every occurrence of a tag.
    ///
    /// # Errors
    ///
    /// Returns `Error::TaskNotFound` for an unknown task.
    pub fn remove_tag(&self, id: &str, tag: &str) -> Result<Task> {
        self.modify(id, |task| {
            task.tags.retain(|t| t != tag);
            Ok(())
        })
    }

    /// Tasks for a view, or for a project when `project_id` is given, in display order.
    pub fn filter(&self, view: View, project_id: Option<&str>) -> Vec<Task> {
        query::filter_tasks(&self.tasks.borrow(), view, project_id, self.clock.today())
    }

    /// Case-insensitive search over title, description and tags.
    pub fn search(&self, text: &str) -> Vec<Task> {
        query::search_tasks(&self.tasks.borrow(), text)
    }

    /// Number of incomplete tasks in a view.
    pub fn pending_count(&self, view: View) -> usize {
        query::pending_in_view(&self.tasks.borrow(), view, self.clock.today())
    }

    /// Number of tasks referencing a project.
    pub fn count_in_project(&self, project_id: &str) -> usize {
        self.tasks.borrow().iter().filter(|t| t.project_id.as_deref() == Some(project_id)).count()
    }

    /// Apply `change` to one task, persist, and publish `task:updated`.
    ///
    /// The change runs on a copy, so a failed change leaves the task untouched.
    fn modify<F>(&self, id: &str, change: F) -> Result<Task>
    where
        F: FnOnce(&mut Task) -> Result<()>,
    {
        let updated = {
            let mut tasks = self.tasks.borrow_mut();
            let slot = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            let mut candidate = slot.clone();
            change(&mut candidate)?;
            slot.clone_from(&candidate);
            candidate
        };
        self.persist();
        tracing::debug!(id, "task updated");
        self.bus.publish(&Event::TaskUpdated(updated.clone()));
        Ok(updated)
    }

    /// Read-modify-write: replace the stored task array with ours.
    fn persist(&self) {
        let mut doc = self.gateway.load();
        doc.tasks = self.tasks.borrow().clone();
        self.gateway.save(&doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{names, WILDCARD};
    use crate::models::Document;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::traits::FixedClock;

    struct Fixture {
        store: MemoryStore,
        gateway: Rc<StorageGateway>,
        bus: Rc<EventBus>,
        tasks: TaskManager,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 15).unwrap()
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let gateway = Rc::new(StorageGateway::with_store(Box::new(store.clone())));
        let bus = Rc::new(EventBus::new());
        let tasks =
            TaskManager::new(Rc::clone(&gateway), Rc::clone(&bus), Rc::new(FixedClock::on(today())));
        Fixture { store, gateway, bus, tasks }
    }

    fn stored(f: &Fixture) -> Document {
        f.gateway.load()
    }

    fn record_events(bus: &EventBus) -> Rc<RefCell<Vec<(String, String)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        bus.subscribe(WILDCARD, move |e| {
            sink.borrow_mut().push((e.name().to_string(), e.payload()["id"].to_string()));
            Ok(())
        });
        log
    }

    #[test]
    fn test_create_persists_and_emits() {
        let f = fixture();
        let events = record_events(&f.bus);

        let task = f.tasks.create(NewTask::titled("  Buy milk ")).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.status, WorkflowStatus::Todo);
        assert_eq!(task.created_at, Some(FixedClock::on(today()).now()));

        assert_eq!(stored(&f).tasks, vec![task.clone()]);
        assert_eq!(events.borrow().len(), 1);
        assert_eq!(events.borrow()[0].0, names::TASK_CREATED);
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let f = fixture();
        let err = f.tasks.create(NewTask::titled("   ")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(f.tasks.list().is_empty());
        assert!(f.store.get(crate::storage::DOCUMENT_KEY).unwrap().is_none());
    }

    #[test]
    fn test_create_with_status_done_sets_flag() {
        let f = fixture();
        let task = f
            .tasks
            .create(NewTask { status: Some(WorkflowStatus::Done), ..NewTask::titled("x") })
            .unwrap();
        assert!(task.done);
    }

    #[test]
    fn test_create_skips_blank_subtasks() {
        let f = fixture();
        let task = f
            .tasks
            .create(NewTask {
                subtasks: vec!["one".into(), " ".into(), "two".into()],
                ..NewTask::titled("x")
            })
            .unwrap();
        let texts: Vec<&str> = task.subtasks.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_persist_keeps_other_document_parts() {
        let f = fixture();
        let mut doc = Document::default();
        doc.settings.notifications = false;
        f.gateway.save(&doc);

        f.tasks.create(NewTask::titled("x")).unwrap();
        assert!(!stored(&f).settings.notifications);
    }

    #[test]
    fn test_unreadable_due_date_does_not_wipe_document() {
        let store = MemoryStore::new();
        store
            .set(
                crate::storage::DOCUMENT_KEY,
                r#"{"tasks":[{"id":"a","title":"Keep me"},{"id":"b","title":"B","dueDate":"next week"}],
                    "projects":[{"id":"p","name":"Home"}]}"#,
            )
            .unwrap();
        let gateway = Rc::new(StorageGateway::with_store(Box::new(store.clone())));
        let tasks = TaskManager::new(
            Rc::clone(&gateway),
            Rc::new(EventBus::new()),
            Rc::new(FixedClock::on(today())),
        );

        tasks.create(NewTask::titled("new")).unwrap();
        let after = store.get(crate::storage::DOCUMENT_KEY).unwrap().unwrap();
        assert!(after.contains("Keep me"));
        assert!(after.contains("Home"));
        assert_eq!(gateway.load().tasks.len(), 3);
    }

    #[test]
    fn test_update_merges_fields() {
        let f = fixture();
        let task = f.tasks.create(NewTask::titled("Draft")).unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

        let updated = f
            .tasks
            .update(
                &task.id,
                TaskPatch {
                    description: Some("details".into()),
                    due_date: Some(Some(due)),
                    project_id: Some(Some("p".into())),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.description, "details");
        assert_eq!(updated.due_date, Some(due));

        let cleared = f
            .tasks
            .update(&task.id, TaskPatch { project_id: Some(None), ..TaskPatch::default() })
            .unwrap();
        assert!(cleared.project_id.is_none());
        assert_eq!(cleared.due_date, Some(due));
    }

    #[test]
    fn test_update_blank_title_leaves_task_untouched() {
        let f = fixture();
        let task = f.tasks.create(NewTask::titled("Keep")).unwrap();
        let result = f.tasks.update(
            &task.id,
            TaskPatch {
                title: Some(String::new()),
                description: Some("changed".into()),
                ..TaskPatch::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(f.tasks.get(&task.id).unwrap(), task);
    }

    #[test]
    fn test_update_unknown_task() {
        let f = fixture();
        let err = f.tasks.update("nope", TaskPatch::default()).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_patch_syncs_done_and_status() {
        let f = fixture();
        let task = f.tasks.create(NewTask::titled("x")).unwrap();

        let done =
            f.tasks.update(&task.id, TaskPatch { done: Some(true), ..TaskPatch::default() }).unwrap();
        assert_eq!(done.status, WorkflowStatus::Done);

        let reopened =
            f.tasks.update(&task.id, TaskPatch { done: Some(false), ..TaskPatch::default() }).unwrap();
        assert_eq!(reopened.status, WorkflowStatus::Todo);

        let doing = f
            .tasks
            .update(
                &task.id,
                TaskPatch {
                    done: Some(true),
                    status: Some(WorkflowStatus::Doing),
                    ..TaskPatch::default()
                },
            )
            .unwrap();
        assert_eq!(doing.status, WorkflowStatus::Doing);
        assert!(!doing.done);
    }

    #[test]
    fn test_delete() {
        let f = fixture();
        let events = record_events(&f.bus);
        let keep = f.tasks.create(NewTask::titled("keep")).unwrap();
        let gone = f.tasks.create(NewTask::titled("gone")).unwrap();

        let removed = f.tasks.delete(&gone.id).unwrap();
        assert_eq!(removed.id, gone.id);
        assert_eq!(stored(&f).tasks, vec![keep]);
        assert_eq!(events.borrow().last().unwrap().0, names::TASK_DELETED);
        assert!(matches!(f.tasks.delete(&gone.id), Err(Error::TaskNotFound(_))));
    }

    #[test]
    fn test_toggle_done_round_trip() {
        let f = fixture();
        let task = f.tasks.create(NewTask::titled("x")).unwrap();

        let done = f.tasks.toggle_done(&task.id).unwrap();
        assert!(done.done);
        assert_eq!(done.status, WorkflowStatus::Done);

        let open = f.tasks.toggle_done(&task.id).unwrap();
        assert!(!open.done);
        assert_eq!(open.status, WorkflowStatus::Todo);
    }

    #[test]
    fn test_toggle_done_reopens_status_only_completion() {
        let f = fixture();
        let task = f.tasks.create(NewTask::titled("x")).unwrap();
        f.tasks.move_task(&task.id, WorkflowStatus::Done).unwrap();

        let open = f.tasks.toggle_done(&task.id).unwrap();
        assert!(!open.is_complete());
    }

    #[test]
    fn test_move_task_keeps_done_in_step() {
        let f = fixture();
        let task = f.tasks.create(NewTask::titled("x")).unwrap();
        assert!(f.tasks.move_task(&task.id, WorkflowStatus::Done).unwrap().done);
        let doing = f.tasks.move_task(&task.id, WorkflowStatus::Doing).unwrap();
        assert!(!doing.done);
        assert_eq!(stored(&f).tasks[0].status, WorkflowStatus::Doing);
    }

    #[test]
    fn test_subtasks() {
        let f = fixture();
        let task = f.tasks.create(NewTask::titled("x")).unwrap();
        let with_sub = f.tasks.add_subtask(&task.id, " step ").unwrap();
        let sub_id = with_sub.subtasks[0].id.clone();
        assert_eq!(with_sub.subtasks[0].text, "step");

        assert!(f.tasks.toggle_subtask(&task.id, &sub_id).unwrap().subtasks[0].done);
        assert!(matches!(
            f.tasks.toggle_subtask(&task.id, "missing"),
            Err(Error::SubtaskNotFound { .. })
        ));
        assert!(f.tasks.add_subtask(&task.id, "").is_err());

        assert!(f.tasks.remove_subtask(&task.id, &sub_id).unwrap().subtasks.is_empty());
        assert!(f.tasks.remove_subtask(&task.id, &sub_id).is_err());
    }

    #[test]
    fn test_tags_allow_duplicates() {
        let f = fixture();
        let task = f.tasks.create(NewTask::titled("x")).unwrap();
        f.tasks.add_tag(&task.id, "home").unwrap();
        let twice = f.tasks.add_tag(&task.id, "home").unwrap();
        assert_eq!(twice.tags, vec!["home", "home"]);
        assert!(f.tasks.remove_tag(&task.id, "home").unwrap().tags.is_empty());
    }

    #[test]
    fn test_inbox_and_today_scenario() {
        let f = fixture();
        let milk = f.tasks.create(NewTask::titled("Buy milk")).unwrap();
        let inbox: Vec<String> = f.tasks.filter(View::Inbox, None).into_iter().map(|t| t.id).collect();
        assert!(inbox.contains(&milk.id));
        assert!(f.tasks.filter(View::Today, None).is_empty());
    }

    #[test]
    fn test_pending_count_and_project_count() {
        let f = fixture();
        f.tasks.create(NewTask { due_date: Some(today()), ..NewTask::titled("a") }).unwrap();
        let b = f
            .tasks
            .create(NewTask {
                due_date: Some(today()),
                project_id: Some("p".into()),
                ..NewTask::titled("b")
            })
            .unwrap();
        assert_eq!(f.tasks.pending_count(View::Today), 2);
        f.tasks.toggle_done(&b.id).unwrap();
        assert_eq!(f.tasks.pending_count(View::Today), 1);
        assert_eq!(f.tasks.count_in_project("p"), 1);
    }

    #[test]
    fn test_reload_sees_other_writers() {
        let f = fixture();
        let other = TaskManager::new(
            Rc::clone(&f.gateway),
            Rc::new(EventBus::new()),
            Rc::new(FixedClock::on(today())),
        );
        other.create(NewTask::titled("from elsewhere")).unwrap();

        assert!(f.tasks.list().is_empty());
        f.tasks.reload();
        assert_eq!(f.tasks.list().len(), 1);
    }

    #[test]
    fn test_handler_can_read_manager_during_publish() {
        let f = fixture();
        let tasks = Rc::new(f.tasks);
        let seen = Rc::new(RefCell::new(0));
        {
            let tasks = Rc::downgrade(&tasks);
            let seen = Rc::clone(&seen);
            f.bus.subscribe(names::TASK_CREATED, move |_| {
                if let Some(tasks) = tasks.upgrade() {
                    *seen.borrow_mut() = tasks.list().len();
                }
                Ok(())
            });
        }
        tasks.create(NewTask::titled("x")).unwrap();
        assert_eq!(*seen.borrow(), 1);
    }
}
