//! Synchronous publish/subscribe for entity changes.
//!
//! Managers publish an [`Event`] after every persisted mutation; the
//! navigator and the optional event log subscribe to them. Delivery happens
//! on the publisher's stack, in subscription order. A handler that returns an
//! error or panics is logged and skipped; later handlers still run.

use crate::models::{Project, Settings, Task};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Subscribe to this name to receive every event.
pub const WILDCARD: &str = "*";

/// Event names.
pub mod names {
    /// A task was created.
    pub const TASK_CREATED: &str = "task:created";
    /// A task was changed.
    pub const TASK_UPDATED: &str = "task:updated";
    /// A task was deleted.
    pub const TASK_DELETED: &str = "task:deleted";
    /// A project was created.
    pub const PROJECT_CREATED: &str = "project:created";
    /// A project was changed.
    pub const PROJECT_UPDATED: &str = "project:updated";
    /// A project was deleted.
    pub const PROJECT_DELETED: &str = "project:deleted";
    /// Settings were changed.
    pub const SETTINGS_UPDATED: &str = "settings:updated";
}

/// An entity change, carrying the affected entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A task was created.
    TaskCreated(Task),
    /// A task was changed.
    TaskUpdated(Task),
    /// A task was deleted.
    TaskDeleted(Task),
    /// A project was created.
    ProjectCreated(Project),
    /// A project was changed.
    ProjectUpdated(Project),
    /// A project was deleted.
    ProjectDeleted(Project),
    /// Settings were changed.
    SettingsUpdated(Settings),
}

impl Event {
    /// The event's name, e.g. `task:created`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TaskCreated(_) => names::TASK_CREATED,
            Self::TaskUpdated(_) => names::TASK_UPDATED,
            Self::TaskDeleted(_) => names::TASK_DELETED,
            Self::ProjectCreated(_) => names::PROJECT_CREATED,
            Self::ProjectUpdated(_) => names::PROJECT_UPDATED,
            Self::ProjectDeleted(_) => names::PROJECT_DELETED,
            Self::SettingsUpdated(_) => names::SETTINGS_UPDATED,
        }
    }

    /// The payload as JSON.
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            Self::TaskCreated(t) | Self::TaskUpdated(t) | Self::TaskDeleted(t) => {
                serde_json::to_value(t)
            }
            Self::ProjectCreated(p) | Self::ProjectUpdated(p) | Self::ProjectDeleted(p) => {
                serde_json::to_value(p)
            }
            Self::SettingsUpdated(s) => serde_json::to_value(s),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// What a handler returns. Errors are logged by the bus.
pub type HandlerResult = std::result::Result<(), Box<dyn std::error::Error>>;

type Handler = Rc<dyn Fn(&Event) -> HandlerResult>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    name: String,
    handler: Handler,
}

/// A handler that failed during one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// The failing subscription.
    pub subscription: SubscriptionId,
    /// Error or panic message.
    pub message: String,
}

/// Outcome of one publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Handlers that ran to completion.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: Vec<HandlerFailure>,
}

impl PublishReport {
    /// Whether every handler succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An ordered observer list keyed by event name.
#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.subscribers.borrow().iter().map(|s| s.name.clone()).collect();
        f.debug_struct("EventBus").field("subscribers", &names).finish()
    }
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events named `name`, or for all events with [`WILDCARD`].
    pub fn subscribe<F>(&self, name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) -> HandlerResult + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            name: name.to_string(),
            handler: Rc::new(handler),
        });
        id
    }

    /// Remove a subscription. Returns false if it was not registered under `name`.
    pub fn unsubscribe(&self, name: &str, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| !(s.id == id && s.name == name));
        subscribers.len() != before
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Deliver `event` to every matching handler.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe; the change applies from the next publish.
    pub fn publish(&self, event: &Event) -> PublishReport {
        let targets: Vec<(SubscriptionId, Handler)> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.name == event.name() || s.name == WILDCARD)
            .map(|s| (s.id, Rc::clone(&s.handler)))
            .collect();

        let mut report = PublishReport::default();
        for (id, handler) in targets {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
            let message = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            tracing::warn!(event = event.name(), subscription = id.0, %message, "event handler failed");
            report.failed.push(HandlerFailure { subscription: id, message });
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
