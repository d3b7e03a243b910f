//! Task management.
//!
//! [`TaskManager`] keeps the task collection in memory, writes the whole
//! document back through the [`StorageGateway`](crate::storage::StorageGateway)
//! after each change, then publishes a `task:*` event.
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//! use taskdeck::events::EventBus;
//! use taskdeck::storage::{MemoryStore, StorageGateway};
//! use taskdeck::tasks::{NewTask, TaskManager};
//! use taskdeck::traits::SystemClock;
//! use taskdeck::view::View;
//!
//! let gateway = Rc::new(StorageGateway::with_store(Box::new(MemoryStore::new())));
//! let tasks = TaskManager::new(gateway, Rc::new(EventBus::new()), Rc::new(SystemClock));
//!
//! let task = tasks.create(NewTask::titled("Buy milk")).unwrap();
//! assert_eq!(tasks.filter(View::Inbox, None)[0].id, task.id);
//! ```

mod manager;
pub mod query;

pub use manager::{NewTask, TaskManager, TaskPatch};
