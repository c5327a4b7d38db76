//! Task store: the async actions that reconcile local state with the remote API.
//!
//! # Design
//! `TaskStore` is an explicit container created by the application root and
//! handed to consumers by reference (or cloned; clones share state). Each
//! action performs at most one remote call and then applies a single
//! `TasksState` transition under the write lock. The lock is never held
//! across a network await, so readers always observe a state that is either
//! before or after an action, never in between.
//!
//! Remote failures are converted into `ActionError` at this boundary and only
//! the fixed message lands in `TasksState::error`. Concurrent fetches are not
//! deduplicated: whichever resolves last wins.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::error::{ActionError, ApiError};
use crate::http::Transport;
use crate::remote::RemoteClient;
use crate::state::{LoadStatus, TasksState};
use crate::types::{NewTask, Priority, Task, TaskChanges, TaskFilter, TaskId};

pub struct TaskStore<T> {
    remote: RemoteClient<T>,
    state: Arc<RwLock<TasksState>>,
}

impl<T: Clone> Clone for TaskStore<T> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Transport> TaskStore<T> {
    pub fn new(remote: RemoteClient<T>) -> Self {
        Self {
            remote,
            state: Arc::new(RwLock::new(TasksState::new())),
        }
    }

    pub fn from_config(config: &ClientConfig, transport: T) -> Self {
        Self::new(RemoteClient::new(TodoClient::new(&config.base_url), transport))
    }

    pub fn remote(&self) -> &RemoteClient<T> {
        &self.remote
    }

    // -----------------------------------------------------------------------
    // Readers
    // -----------------------------------------------------------------------

    pub async fn snapshot(&self) -> TasksState {
        self.state.read().await.clone()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks().to_vec()
    }

    pub async fn task(&self, id: TaskId) -> Option<Task> {
        self.state.read().await.task(id).cloned()
    }

    pub async fn status(&self) -> LoadStatus {
        self.state.read().await.status()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error().map(str::to_string)
    }

    pub async fn filtered(&self, filter: TaskFilter) -> Vec<Task> {
        self.state.read().await.filtered(filter)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Replace the collection with the remote list.
    pub async fn fetch(&self, cancel: &CancellationToken) -> Result<(), ActionError> {
        if cancel.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        self.state.write().await.fetch_pending();

        match cancellable(cancel, self.remote.list_tasks()).await {
            None => {
                debug!("fetch cancelled");
                self.state.write().await.fetch_cancelled();
                Err(ActionError::Cancelled)
            }
            Some(Ok(todos)) => {
                let count = todos.len();
                self.state
                    .write()
                    .await
                    .fetch_fulfilled(todos, &mut rand::rng());
                info!(count, "fetched tasks");
                Ok(())
            }
            Some(Err(e)) => {
                let err = ActionError::FetchFailed(e);
                warn!(error = %err, cause = ?err.api_error(), "fetch failed");
                self.state.write().await.fetch_rejected(err.to_string());
                Err(err)
            }
        }
    }

    /// Create the task remotely, then append it with the caller's local fields.
    ///
    /// Returns the task as stored; its id is the server's unless that id was
    /// already taken locally.
    pub async fn add(&self, input: NewTask, cancel: &CancellationToken) -> Result<Task, ActionError> {
        if cancel.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        let payload = input.remote();

        let created = match cancellable(cancel, self.remote.create_task(&payload)).await {
            None => return Err(ActionError::Cancelled),
            Some(Ok(created)) => created,
            Some(Err(e)) => return Err(self.reject_mutation(ActionError::AddFailed(e)).await),
        };

        let priority = input
            .priority
            .unwrap_or_else(|| Priority::random(&mut rand::rng()));
        let mut task = Task {
            id: created.id,
            todo: created.todo,
            completed: created.completed,
            user_id: created.user_id,
            priority,
            deadline: input.deadline,
            description: input.description,
        };
        task.id = self.state.write().await.task_added(task.clone());
        info!(id = task.id, "added task");
        Ok(task)
    }

    /// Apply `changes` to task `id`.
    ///
    /// Remote-backed fields are sent first. As soon as the server has answered,
    /// whatever the status or body, the full change set (local-only fields
    /// included) is merged locally. A non-2xx answer is still reported as
    /// `UpdateFailed`. Only a request that never got an answer, or a
    /// cancellation, leaves the task untouched. An unknown id is a silent no-op.
    pub async fn update(
        &self,
        id: TaskId,
        changes: TaskChanges,
        cancel: &CancellationToken,
    ) -> Result<(), ActionError> {
        if cancel.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        if !self.state.read().await.contains(id) {
            debug!(id, "update of unknown task ignored");
            return Ok(());
        }

        let remote_changes = changes.remote();
        if !remote_changes.is_empty() {
            match cancellable(cancel, self.remote.update_task(id, &remote_changes)).await {
                None => return Err(ActionError::Cancelled),
                Some(Ok(_)) => {}
                Some(Err(e)) if e.has_response() => {
                    self.state.write().await.task_updated(id, &changes);
                    debug!(id, "updated task locally after remote rejection");
                    return Err(self.reject_mutation(ActionError::UpdateFailed(e)).await);
                }
                Some(Err(e)) => return Err(self.reject_mutation(ActionError::UpdateFailed(e)).await),
            }
        }

        self.state.write().await.task_updated(id, &changes);
        debug!(id, "updated task");
        Ok(())
    }

    /// Delete task `id` remotely, then locally. An unknown id is a silent no-op.
    ///
    /// A remote 404 means the server never had (or no longer has) the task,
    /// so it is removed locally as if the delete had succeeded.
    pub async fn delete(&self, id: TaskId, cancel: &CancellationToken) -> Result<(), ActionError> {
        if cancel.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        if !self.state.read().await.contains(id) {
            debug!(id, "delete of unknown task ignored");
            return Ok(());
        }

        match cancellable(cancel, self.remote.delete_task(id)).await {
            None => Err(ActionError::Cancelled),
            Some(Ok(())) | Some(Err(ApiError::NotFound)) => {
                self.state.write().await.task_deleted(id);
                info!(id, "deleted task");
                Ok(())
            }
            Some(Err(e)) => Err(self.reject_mutation(ActionError::DeleteFailed(e)).await),
        }
    }

    /// Flip `completed` locally without contacting the remote API.
    ///
    /// Returns the new value, or `None` when no task has `id`.
    pub async fn toggle_completion(&self, id: TaskId) -> Option<bool> {
        self.state.write().await.toggle_completion(id)
    }

    /// Flip `completed` through the update path so the remote API sees it.
    pub async fn sync_completion(
        &self,
        id: TaskId,
        cancel: &CancellationToken,
    ) -> Result<Option<bool>, ActionError> {
        let Some(current) = self.state.read().await.task(id).map(|t| t.completed) else {
            return Ok(None);
        };
        let changes = TaskChanges {
            completed: Some(!current),
            ..Default::default()
        };
        self.update(id, changes, cancel).await?;
        Ok(Some(!current))
    }

    /// Reload the remote-backed fields of one task, keeping its local fields.
    ///
    /// Failures are returned but not recorded: a single-task read does not
    /// describe the collection's load state.
    pub async fn refresh_task(&self, id: TaskId, cancel: &CancellationToken) -> Result<bool, ActionError> {
        if cancel.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        if !self.state.read().await.contains(id) {
            return Ok(false);
        }
        match cancellable(cancel, self.remote.get_task(id)).await {
            None => Err(ActionError::Cancelled),
            Some(Ok(remote)) => Ok(self.state.write().await.task_refreshed(remote)),
            Some(Err(e)) => {
                warn!(id, error = %e, "refresh failed");
                Err(ActionError::FetchFailed(e))
            }
        }
    }

    async fn reject_mutation(&self, err: ActionError) -> ActionError {
        warn!(error = %err, cause = ?err.api_error(), "task mutation failed");
        self.state.write().await.mutation_rejected(err.to_string());
        err
    }
}

/// Run `fut` unless `cancel` fires first. A token that is already cancelled
/// always wins.
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}
