//! Project management.
//!
//! Projects group tasks by a weak reference: a task stores the project id and
//! nothing enforces that the project exists. Deleting a project first clears
//! the reference on every task that points at it.

use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::id::{generate_id, PROJECT_PREFIX};
use crate::models::{Project, ViewMode, DEFAULT_PROJECT_COLOR};
use crate::storage::StorageGateway;
use crate::tasks::{TaskManager, TaskPatch};
use std::cell::RefCell;
use std::rc::Rc;

/// Fields for a new project.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Name (required, trimmed).
    pub name: String,
    /// Color hint; the default blue if unset.
    pub color: Option<String>,
    /// Layout.
    pub view: ViewMode,
}

impl NewProject {
    /// A list-view project with the default color.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), color: None, view: ViewMode::List }
    }
}

/// Fields that can be updated on a project.
#[derive(Debug, Default, Clone)]
pub struct ProjectPatch {
    /// New name (if Some).
    pub name: Option<String>,
    /// New color (if Some).
    pub color: Option<String>,
    /// New layout (if Some).
    pub view: Option<ViewMode>,
}

impl ProjectPatch {
    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.view.is_none()
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("project name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// In-memory project collection persisted through the storage gateway.
pub struct ProjectManager {
    gateway: Rc<StorageGateway>,
    bus: Rc<EventBus>,
    tasks: Rc<TaskManager>,
    projects: RefCell<Vec<Project>>,
}

impl std::fmt::Debug for ProjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectManager").field("projects", &self.projects.borrow().len()).finish()
    }
}

impl ProjectManager {
    /// Load the project collection from the gateway.
    pub fn new(gateway: Rc<StorageGateway>, bus: Rc<EventBus>, tasks: Rc<TaskManager>) -> Self {
        let projects = gateway.load().projects;
        Self { gateway, bus, tasks, projects: RefCell::new(projects) }
    }

    /// Re-read the collection from storage.
    pub fn reload(&self) {
        *self.projects.borrow_mut() = self.gateway.load().projects;
    }

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the name is blank.
    pub fn create(&self, fields: NewProject) -> Result<Project> {
        let project = Project {
            id: generate_id(PROJECT_PREFIX),
            name: validate_name(&fields.name)?,
            color: fields
                .color
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            view: fields.view,
            extra: serde_json::Map::new(),
        };
        self.projects.borrow_mut().push(project.clone());
        self.persist();
        tracing::debug!(id = %project.id, "project created");
        self.bus.publish(&Event::ProjectCreated(project.clone()));
        Ok(project)
    }

    /// Get a project by ID.
    pub fn get(&self, id: &str) -> Option<Project> {
        self.projects.borrow().iter().find(|p| p.id == id).cloned()
    }

    /// Find a project by exact id, falling back to a case-insensitive name match.
    pub fn find(&self, id_or_name: &str) -> Option<Project> {
        self.get(id_or_name).or_else(|| {
            let wanted = id_or_name.trim().to_lowercase();
            self.projects.borrow().iter().find(|p| p.name.to_lowercase() == wanted).cloned()
        })
    }

    /// All projects in creation order.
    pub fn list(&self) -> Vec<Project> {
        self.projects.borrow().clone()
    }

    /// Merge `patch` into a project.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProjectNotFound` or `Error::Validation`.
    pub fn update(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let updated = {
            let mut projects = self.projects.borrow_mut();
            let project = projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;
            if let Some(name) = name {
                project.name = name;
            }
            if let Some(color) = patch.color {
                project.color = color;
            }
            if let Some(view) = patch.view {
                project.view = view;
            }
            project.clone()
        };
        self.persist();
        self.bus.publish(&Event::ProjectUpdated(updated.clone()));
        Ok(updated)
    }

    /// Delete a project, detaching its tasks first.
    ///
    /// Each detached task goes through [`TaskManager::update`], so it is
    /// persisted and announced as `task:updated` before the project goes.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProjectNotFound` for an unknown id.
    pub fn delete(&self, id: &str) -> Result<Project> {
        if self.get(id).is_none() {
            return Err(Error::ProjectNotFound(id.to_string()));
        }

        let orphaned: Vec<String> = self
            .tasks
            .list()
            .into_iter()
            .filter(|t| t.project_id.as_deref() == Some(id))
            .map(|t| t.id)
            .collect();
        for task_id in &orphaned {
            self.tasks.update(task_id, TaskPatch { project_id: Some(None), ..TaskPatch::default() })?;
        }

        let removed = {
            let mut projects = self.projects.borrow_mut();
            let index = projects
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| Error::ProjectNotFound(id.to_string()))?;
            projects.remove(index)
        };
        self.persist();
        tracing::debug!(id, detached = orphaned.len(), "project deleted");
        self.bus.publish(&Event::ProjectDeleted(removed.clone()));
        Ok(removed)
    }

    /// Number of tasks referencing a project.
    pub fn task_count(&self, id: &str) -> usize {
        self.tasks.count_in_project(id)
    }

    fn persist(&self) {
        let mut doc = self.gateway.load();
        doc.projects = self.projects.borrow().clone();
        self.gateway.save(&doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{names, WILDCARD};
    use crate::storage::MemoryStore;
    use crate::tasks::NewTask;
    use crate::traits::SystemClock;

    struct Fixture {
        gateway: Rc<StorageGateway>,
        bus: Rc<EventBus>,
        tasks: Rc<TaskManager>,
        projects: ProjectManager,
    }

    fn fixture() -> Fixture {
        let gateway = Rc::new(StorageGateway::with_store(Box::new(MemoryStore::new())));
        let bus = Rc::new(EventBus::new());
        let tasks =
            Rc::new(TaskManager::new(Rc::clone(&gateway), Rc::clone(&bus), Rc::new(SystemClock)));
        let projects = ProjectManager::new(Rc::clone(&gateway), Rc::clone(&bus), Rc::clone(&tasks));
        Fixture { gateway, bus, tasks, projects }
    }

    #[test]
    fn test_create_defaults() {
        let f = fixture();
        let project = f.projects.create(NewProject::named(" Work ")).unwrap();
        assert_eq!(project.name, "Work");
        assert_eq!(project.color, DEFAULT_PROJECT_COLOR);
        assert_eq!(project.view, ViewMode::List);
        assert_eq!(f.gateway.load().projects, vec![project]);
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let f = fixture();
        assert!(matches!(f.projects.create(NewProject::named("")), Err(Error::Validation(_))));
    }

    #[test]
    fn test_update() {
        let f = fixture();
        let project = f.projects.create(NewProject::named("Work")).unwrap();
        let updated = f
            .projects
            .update(
                &project.id,
                ProjectPatch { view: Some(ViewMode::Kanban), ..ProjectPatch::default() },
            )
            .unwrap();
        assert_eq!(updated.view, ViewMode::Kanban);
        assert_eq!(updated.name, "Work");
        assert!(f
            .projects
            .update(&project.id, ProjectPatch { name: Some(" ".into()), ..ProjectPatch::default() })
            .is_err());
        assert!(matches!(
            f.projects.update("nope", ProjectPatch::default()),
            Err(Error::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_find_by_name() {
        let f = fixture();
        let project = f.projects.create(NewProject::named("Home Stuff")).unwrap();
        assert_eq!(f.projects.find("home stuff").unwrap().id, project.id);
        assert_eq!(f.projects.find(&project.id).unwrap().id, project.id);
        assert!(f.projects.find("work").is_none());
    }

    #[test]
    fn test_delete_detaches_tasks() {
        let f = fixture();
        let events = Rc::new(RefCell::new(Vec::new()));
        {
            let events = Rc::clone(&events);
            f.bus.subscribe(WILDCARD, move |e| {
                events.borrow_mut().push(e.name());
                Ok(())
            });
        }

        let work = f.projects.create(NewProject::named("Work")).unwrap();
        let other = f.projects.create(NewProject::named("Other")).unwrap();
        let a = f
            .tasks
            .create(NewTask { project_id: Some(work.id.clone()), ..NewTask::titled("a") })
            .unwrap();
        let b = f
            .tasks
            .create(NewTask { project_id: Some(other.id.clone()), ..NewTask::titled("b") })
            .unwrap();
        events.borrow_mut().clear();

        f.projects.delete(&work.id).unwrap();

        assert!(f.tasks.get(&a.id).unwrap().project_id.is_none());
        assert_eq!(f.tasks.get(&b.id).unwrap().project_id, Some(other.id.clone()));
        assert_eq!(f.tasks.filter(crate::view::View::All, Some(&work.id)).len(), 0);

        let doc = f.gateway.load();
        assert_eq!(doc.projects, vec![other]);
        assert!(doc.tasks.iter().find(|t| t.id == a.id).unwrap().project_id.is_none());

        assert_eq!(*events.borrow(), vec![names::TASK_UPDATED, names::PROJECT_DELETED]);
    }

    #[test]
    fn test_delete_unknown() {
        let f = fixture();
        assert!(matches!(f.projects.delete("nope"), Err(Error::ProjectNotFound(_))));
    }

    #[test]
    fn test_task_count() {
        let f = fixture();
        let work = f.projects.create(NewProject::named("Work")).unwrap();
        assert_eq!(f.projects.task_count(&work.id), 0);
        f.tasks
            .create(NewTask { project_id: Some(work.id.clone()), ..NewTask::titled("a") })
            .unwrap();
        assert_eq!(f.projects.task_count(&work.id), 1);
    }
}
