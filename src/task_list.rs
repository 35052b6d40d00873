//! In-memory task list kept in step with the remote service.
//!
//! Every remote operation is split in two: a `begin_*` call that builds the
//! request without touching local state, and [`TaskListController::apply`]
//! that merges the response once it arrives. Local state only changes after
//! the server has confirmed a mutation. Requests that are in flight at the
//! same time are applied in whatever order their completions are handed to
//! `apply`; nothing orders two updates to the same task.

use std::{fmt, str::FromStr, sync::Arc};

use futures::future::{BoxFuture, FutureExt};
use tracing::{error, info};

use crate::error::Result;
use crate::service::TaskService;
use crate::task::{Task, TaskDraft, TaskId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Completed,
    Pending,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Completed, Filter::Pending];

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Completed => task.completed,
            Filter::Pending => !task.completed,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Completed,
            Filter::Completed => Filter::Pending,
            Filter::Pending => Filter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Completed => "completed",
            Filter::Pending => "pending",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Filter::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter {s:?} (expected all, completed or pending)"))
    }
}

/// Which task is being retitled, and the text typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    pub target: Option<TaskId>,
    pub draft: String,
}

/// Why an update request was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    Toggle,
    Edit,
    Refresh,
}

/// Outcome of a remote request, ready to be merged into the list.
#[derive(Debug)]
pub enum Completion {
    Loaded(Result<Vec<Task>>),
    Created {
        title: String,
        result: Result<Task>,
    },
    Updated {
        id: TaskId,
        origin: UpdateOrigin,
        result: Result<Task>,
    },
    Removed {
        id: TaskId,
        result: Result<()>,
    },
}

pub type PendingRequest = BoxFuture<'static, Completion>;

pub struct TaskListController<S> {
    service: Arc<S>,
    tasks: Vec<Task>,
    filter: Filter,
    draft: String,
    edit: EditSession,
    last_error: Option<String>,
}

impl<S: TaskService + 'static> TaskListController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            tasks: Vec::new(),
            filter: Filter::default(),
            draft: String::new(),
            edit: EditSession::default(),
            last_error: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// Tasks matching the current filter, in list order.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        let filter = self.filter;
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.edit.target
    }

    pub fn edit_draft(&self) -> &str {
        &self.edit.draft
    }

    pub fn set_edit_draft(&mut self, text: impl Into<String>) {
        self.edit.draft = text.into();
    }

    pub fn start_editing(&mut self, id: TaskId, current_title: impl Into<String>) {
        self.edit = EditSession {
            target: Some(id),
            draft: current_title.into(),
        };
    }

    pub fn cancel_editing(&mut self) {
        self.edit = EditSession::default();
    }

    /// Message of the most recent failed request, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn begin_load(&self) -> PendingRequest {
        let service = Arc::clone(&self.service);
        async move { Completion::Loaded(service.list().await) }.boxed()
    }

    /// `None` when the title is blank; no request is made.
    pub fn begin_add(&self, title: &str) -> Option<PendingRequest> {
        if title.trim().is_empty() {
            return None;
        }
        let service = Arc::clone(&self.service);
        let draft = TaskDraft::new(title);
        Some(
            async move {
                let result = service.create(&draft).await;
                Completion::Created {
                    title: draft.title,
                    result,
                }
            }
            .boxed(),
        )
    }

    pub fn begin_remove(&self, id: TaskId) -> PendingRequest {
        let service = Arc::clone(&self.service);
        async move {
            Completion::Removed {
                id,
                result: service.delete(id).await,
            }
        }
        .boxed()
    }

    pub fn begin_toggle(&self, id: TaskId) -> Option<PendingRequest> {
        let draft = self.task(id)?.toggled();
        Some(self.begin_update(id, UpdateOrigin::Toggle, draft))
    }

    /// `None` unless `id` is the task being edited.
    pub fn begin_save_edit(&self, id: TaskId) -> Option<PendingRequest> {
        if self.edit.target != Some(id) {
            return None;
        }
        let draft = self.task(id)?.retitled(self.edit.draft.clone());
        Some(self.begin_update(id, UpdateOrigin::Edit, draft))
    }

    pub fn begin_refresh(&self, id: TaskId) -> PendingRequest {
        let service = Arc::clone(&self.service);
        async move {
            Completion::Updated {
                id,
                origin: UpdateOrigin::Refresh,
                result: service.fetch(id).await,
            }
        }
        .boxed()
    }

    fn begin_update(&self, id: TaskId, origin: UpdateOrigin, draft: TaskDraft) -> PendingRequest {
        let service = Arc::clone(&self.service);
        async move {
            Completion::Updated {
                id,
                origin,
                result: service.update(id, &draft).await,
            }
        }
        .boxed()
    }

    /// Merges a finished request into local state. Failures are logged and
    /// recorded in `last_error`; the list is left as it was.
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded(Ok(tasks)) => {
                info!(count = tasks.len(), "loaded tasks");
                self.tasks = tasks;
                self.close_orphaned_edit();
                self.last_error = None;
            }
            Completion::Loaded(Err(err)) => self.fail("Error fetching tasks", &err),
            Completion::Created {
                title,
                result: Ok(task),
            } => {
                info!(id = %task.id, "created task");
                self.tasks.push(task);
                // Text typed after the request went out stays.
                if self.draft == title {
                    self.draft.clear();
                }
                self.last_error = None;
            }
            Completion::Created {
                result: Err(err), ..
            } => self.fail("Error adding task", &err),
            Completion::Updated {
                id,
                origin,
                result: Ok(task),
            } => {
                info!(%id, ?origin, "updated task");
                if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == id) {
                    *slot = task;
                }
                if origin == UpdateOrigin::Edit && self.edit.target == Some(id) {
                    self.edit = EditSession::default();
                }
                self.last_error = None;
            }
            Completion::Updated {
                id, result: Err(err), ..
            } => self.fail(&format!("Error updating task {id}"), &err),
            Completion::Removed { id, result: Ok(()) } => {
                info!(%id, "deleted task");
                self.tasks.retain(|t| t.id != id);
                self.close_orphaned_edit();
                self.last_error = None;
            }
            Completion::Removed {
                id,
                result: Err(err),
            } => self.fail(&format!("Error deleting task {id}"), &err),
        }
    }

    fn close_orphaned_edit(&mut self) {
        if let Some(target) = self.edit.target {
            if self.task(target).is_none() {
                self.edit = EditSession::default();
            }
        }
    }

    fn fail(&mut self, what: &str, err: &crate::error::ClientError) {
        error!("{what}: {err}");
        self.last_error = Some(format!("{what}: {err}"));
    }

    pub async fn load(&mut self) {
        let pending = self.begin_load();
        self.apply(pending.await);
    }

    pub async fn add_task(&mut self, title: &str) {
        if let Some(pending) = self.begin_add(title) {
            self.apply(pending.await);
        }
    }

    pub async fn submit_draft(&mut self) {
        let title = self.draft.clone();
        self.add_task(&title).await;
    }

    pub async fn remove_task(&mut self, id: TaskId) {
        let pending = self.begin_remove(id);
        self.apply(pending.await);
    }

    pub async fn toggle_complete(&mut self, id: TaskId) {
        if let Some(pending) = self.begin_toggle(id) {
            self.apply(pending.await);
        }
    }

    pub async fn save_edit(&mut self, id: TaskId) {
        if let Some(pending) = self.begin_save_edit(id) {
            self.apply(pending.await);
        }
    }

    pub async fn refresh_task(&mut self, id: TaskId) {
        let pending = self.begin_refresh(id);
        self.apply(pending.await);
    }
}

#[cfg(test)]
#[path = "tests/task_list_tests.rs"]
mod tests;
