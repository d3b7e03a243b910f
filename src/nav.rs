//! Navigation: which screen is showing, and the badge counts beside each view.
//!
//! The current view lives only in memory. Counts are recomputed after every
//! navigation and after every entity event on the bus.

use crate::error::{Error, Result};
use crate::events::{EventBus, SubscriptionId, WILDCARD};
use crate::models::{Project, Task, ViewMode};
use crate::projects::ProjectManager;
use crate::render::{self, KanbanBoard, ProjectListView, TaskListView};
use crate::tasks::{query, TaskManager};
use crate::view::View;
use chrono::NaiveDate;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// What the navigator decided to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", content = "model", rename_all = "snake_case")]
pub enum Screen {
    /// A flat list.
    TaskList(TaskListView),
    /// A project board.
    Kanban(KanbanBoard),
    /// The project overview.
    Projects(ProjectListView),
}

/// Pending tasks per view, plus the number of projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewCounts {
    /// Incomplete tasks without a project.
    pub inbox: usize,
    /// Incomplete tasks due today.
    pub today: usize,
    /// Incomplete tasks due in the next seven days.
    pub week: usize,
    /// Incomplete tasks due in the next thirty days.
    pub month: usize,
    /// Number of projects.
    pub projects: usize,
}

impl ViewCounts {
    /// Compute counts from the collections.
    #[must_use]
    pub fn compute(tasks: &[Task], projects: &[Project], today: NaiveDate) -> Self {
        Self {
            inbox: query::pending_in_view(tasks, View::Inbox, today),
            today: query::pending_in_view(tasks, View::Today, today),
            week: query::pending_in_view(tasks, View::Week, today),
            month: query::pending_in_view(tasks, View::Month, today),
            projects: projects.len(),
        }
    }

    /// The badge for a view, if it has one.
    #[must_use]
    pub const fn for_view(&self, view: View) -> Option<usize> {
        match view {
            View::Inbox => Some(self.inbox),
            View::Today => Some(self.today),
            View::Week => Some(self.week),
            View::Month => Some(self.month),
            View::Projects => Some(self.projects),
            View::All => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Location {
    view: View,
    project_id: Option<String>,
}

/// Tracks the current view and keeps counts fresh.
pub struct Navigator {
    tasks: Rc<TaskManager>,
    projects: Rc<ProjectManager>,
    bus: Rc<EventBus>,
    subscription: SubscriptionId,
    location: RefCell<Location>,
    counts: Rc<RefCell<ViewCounts>>,
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("location", &self.location.borrow())
            .field("counts", &self.counts.borrow())
            .finish_non_exhaustive()
    }
}

impl Navigator {
    /// Start at the inbox and subscribe to every bus event.
    ///
    /// The subscription holds only weak references to the managers, and is
    /// removed when the navigator is dropped.
    pub fn new(tasks: Rc<TaskManager>, projects: Rc<ProjectManager>, bus: Rc<EventBus>) -> Self {
        let counts = Rc::new(RefCell::new(ViewCounts::default()));
        let subscription = {
            let tasks: Weak<TaskManager> = Rc::downgrade(&tasks);
            let projects: Weak<ProjectManager> = Rc::downgrade(&projects);
            let counts = Rc::clone(&counts);
            bus.subscribe(WILDCARD, move |_| {
                if let (Some(tasks), Some(projects)) = (tasks.upgrade(), projects.upgrade()) {
                    *counts.borrow_mut() = compute_counts(&tasks, &projects);
                }
                Ok(())
            })
        };
        let navigator = Self {
            tasks,
            projects,
            bus,
            subscription,
            location: RefCell::new(Location::default()),
            counts,
        };
        navigator.recount();
        navigator
    }

    /// The current view and project.
    pub fn current(&self) -> (View, Option<String>) {
        let location = self.location.borrow();
        (location.view, location.project_id.clone())
    }

    /// The latest counts.
    pub fn counts(&self) -> ViewCounts {
        *self.counts.borrow()
    }

    /// Move to a view, or to a project when `project_id` is given, and build
    /// its screen.
    ///
    /// A project opens as a board or a list according to its view mode.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProjectNotFound` if the project does not exist. The
    /// current location is left unchanged in that case.
    pub fn navigate(&self, view: View, project_id: Option<&str>) -> Result<Screen> {
        let screen = self.build(view, project_id)?;
        *self.location.borrow_mut() =
            Location { view, project_id: project_id.map(ToString::to_string) };
        self.recount();
        Ok(screen)
    }

    /// Rebuild the current screen.
    ///
    /// If the current project was deleted in the meantime, falls back to the
    /// inbox.
    ///
    /// # Errors
    ///
    /// Returns an error only if the fallback also fails.
    pub fn refresh(&self) -> Result<Screen> {
        let (view, project_id) = self.current();
        match self.navigate(view, project_id.as_deref()) {
            Err(Error::ProjectNotFound(_)) => self.navigate(View::Inbox, None),
            other => other,
        }
    }

    /// A list screen of search results. Does not change the location.
    pub fn search(&self, text: &str) -> Screen {
        let today = self.tasks.clock().today();
        let results = self.tasks.search(text);
        Screen::TaskList(render::task_list(
            &format!("Search: {}", text.trim()),
            &results,
            &self.projects.list(),
            today,
        ))
    }

    fn build(&self, view: View, project_id: Option<&str>) -> Result<Screen> {
        let today = self.tasks.clock().today();
        let projects = self.projects.list();

        if let Some(pid) = project_id {
            let project = self
                .projects
                .get(pid)
                .ok_or_else(|| Error::ProjectNotFound(pid.to_string()))?;
            let tasks = self.tasks.filter(view, Some(pid));
            return Ok(match project.view {
                ViewMode::Kanban => {
                    Screen::Kanban(render::kanban(&project.name, &tasks, &projects, today))
                }
                ViewMode::List => {
                    Screen::TaskList(render::task_list(&project.name, &tasks, &projects, today))
                }
            });
        }

        if view == View::Projects {
            return Ok(Screen::Projects(render::project_list(&projects, &self.tasks.list())));
        }

        let tasks = self.tasks.filter(view, None);
        Ok(Screen::TaskList(render::task_list(view.title(), &tasks, &projects, today)))
    }

    fn recount(&self) {
        *self.counts.borrow_mut() = compute_counts(&self.tasks, &self.projects);
    }
}

impl Drop for Navigator {
    fn drop(&mut self) {
        self.bus.unsubscribe(WILDCARD, self.subscription);
    }
}

fn compute_counts(tasks: &TaskManager, projects: &ProjectManager) -> ViewCounts {
    ViewCounts::compute(&tasks.list(), &projects.list(), tasks.clock().today())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkflowStatus;
    use crate::projects::NewProject;
    use crate::storage::{MemoryStore, StorageGateway};
    use crate::tasks::NewTask;
    use crate::traits::FixedClock;

    struct Fixture {
        bus: Rc<EventBus>,
        tasks: Rc<TaskManager>,
        projects: Rc<ProjectManager>,
        nav: Navigator,
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
    }

    fn fixture() -> Fixture {
        let gateway = Rc::new(StorageGateway::with_store(Box::new(MemoryStore::new())));
        let bus = Rc::new(EventBus::new());
        let tasks = Rc::new(TaskManager::new(
            Rc::clone(&gateway),
            Rc::clone(&bus),
            Rc::new(FixedClock::on(today())),
        ));
        let projects =
            Rc::new(ProjectManager::new(Rc::clone(&gateway), Rc::clone(&bus), Rc::clone(&tasks)));
        let nav = Navigator::new(Rc::clone(&tasks), Rc::clone(&projects), Rc::clone(&bus));
        Fixture { bus, tasks, projects, nav }
    }

    #[test]
    fn test_starts_at_inbox() {
        let f = fixture();
        assert_eq!(f.nav.current(), (View::Inbox, None));
        assert_eq!(f.nav.counts(), ViewCounts::default());
    }

    #[test]
    fn test_named_view_shows_task_list() {
        let f = fixture();
        f.tasks.create(NewTask { due_date: Some(today()), ..NewTask::titled("Call") }).unwrap();
        let Screen::TaskList(list) = f.nav.navigate(View::Today, None).unwrap() else {
            panic!("expected a task list");
        };
        assert_eq!(list.heading, "Today");
        assert_eq!(list.cards.len(), 1);
        assert_eq!(f.nav.current(), (View::Today, None));
    }

    #[test]
    fn test_projects_view() {
        let f = fixture();
        f.projects.create(NewProject::named("Work")).unwrap();
        assert!(matches!(f.nav.navigate(View::Projects, None).unwrap(), Screen::Projects(v) if v.cards.len() == 1));
    }

    #[test]
    fn test_project_view_mode_selects_screen() {
        let f = fixture();
        let board = f
            .projects
            .create(NewProject { view: ViewMode::Kanban, ..NewProject::named("Work") })
            .unwrap();
        let list = f.projects.create(NewProject::named("Home")).unwrap();

        assert!(matches!(f.nav.navigate(View::Inbox, Some(&board.id)).unwrap(), Screen::Kanban(_)));
        assert!(matches!(f.nav.navigate(View::Inbox, Some(&list.id)).unwrap(), Screen::TaskList(_)));
        assert_eq!(f.nav.current().1.as_deref(), Some(list.id.as_str()));
    }

    #[test]
    fn test_unknown_project_keeps_location() {
        let f = fixture();
        f.nav.navigate(View::Week, None).unwrap();
        assert!(matches!(f.nav.navigate(View::Inbox, Some("nope")), Err(Error::ProjectNotFound(_))));
        assert_eq!(f.nav.current(), (View::Week, None));
    }

    #[test]
    fn test_counts_follow_events() {
        let f = fixture();
        let task = f.tasks.create(NewTask { due_date: Some(today()), ..NewTask::titled("a") }).unwrap();
        assert_eq!(f.nav.counts().inbox, 1);
        assert_eq!(f.nav.counts().today, 1);
        assert_eq!(f.nav.counts().week, 1);

        f.tasks.toggle_done(&task.id).unwrap();
        assert_eq!(f.nav.counts().today, 0);

        f.projects.create(NewProject::named("Work")).unwrap();
        assert_eq!(f.nav.counts().projects, 1);
        assert_eq!(f.nav.counts().for_view(View::All), None);
    }

    #[test]
    fn test_kanban_scenario() {
        let f = fixture();
        let work = f
            .projects
            .create(NewProject { view: ViewMode::Kanban, ..NewProject::named("Work") })
            .unwrap();
        let plan = f
            .tasks
            .create(NewTask {
                project_id: Some(work.id.clone()),
                status: Some(WorkflowStatus::Todo),
                ..NewTask::titled("Plan")
            })
            .unwrap();

        let Screen::Kanban(board) = f.nav.navigate(View::Inbox, Some(&work.id)).unwrap() else {
            panic!("expected a board");
        };
        assert_eq!(board.column(WorkflowStatus::Todo).unwrap().cards[0].id, plan.id);

        let moved = f.tasks.move_task(&plan.id, WorkflowStatus::Done).unwrap();
        assert!(moved.done);
        let Screen::Kanban(board) = f.nav.refresh().unwrap() else {
            panic!("expected a board");
        };
        assert!(board.column(WorkflowStatus::Todo).unwrap().cards.is_empty());
        assert_eq!(board.column(WorkflowStatus::Done).unwrap().cards[0].id, plan.id);
    }

    #[test]
    fn test_refresh_after_project_deleted_falls_back_to_inbox() {
        let f = fixture();
        let work = f.projects.create(NewProject::named("Work")).unwrap();
        f.nav.navigate(View::Inbox, Some(&work.id)).unwrap();
        f.projects.delete(&work.id).unwrap();

        assert!(matches!(f.nav.refresh().unwrap(), Screen::TaskList(_)));
        assert_eq!(f.nav.current(), (View::Inbox, None));
    }

    #[test]
    fn test_search_screen() {
        let f = fixture();
        f.tasks.create(NewTask { description: "milk and eggs".into(), ..NewTask::titled("Shop") }).unwrap();
        f.tasks.create(NewTask::titled("Bread")).unwrap();
        let Screen::TaskList(list) = f.nav.search("milk") else {
            panic!("expected a task list");
        };
        assert_eq!(list.cards.len(), 1);
        assert_eq!(list.cards[0].title, "Shop");
    }

    #[test]
    fn test_drop_unsubscribes() {
        let f = fixture();
        assert_eq!(f.bus.subscriber_count(), 1);
        drop(f.nav);
        assert_eq!(f.bus.subscriber_count(), 0);
    }
}
