//! Terminal client for a remote to-do list service.

pub mod config;
pub mod error;
pub mod preferences;
pub mod service;
pub mod task;
pub mod task_list;
pub mod ui;

pub use error::{ClientError, Result};
pub use service::{HttpTaskService, TaskService};
pub use task::{Task, TaskDraft, TaskId};
pub use task_list::{Completion, Filter, TaskListController};
