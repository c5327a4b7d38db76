//! In-memory task state and its synchronous transitions.
//!
//! # Design
//! `TasksState` is plain data. Every mutation goes through one of the
//! transition methods below, each of which leaves the state consistent on
//! return; `TaskStore` runs them under its lock after the network call has
//! resolved. Transitions never perform I/O.
//!
//! `status` only describes fetches: add/update/delete write `tasks` or
//! `error` but never move `status`.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Priority, RemoteTodo, Task, TaskChanges, TaskFilter, TaskId};

/// Load status of the task collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksState {
    tasks: Vec<Task>,
    status: LoadStatus,
    error: Option<String>,
    /// Fetches dispatched and not yet settled.
    #[serde(skip)]
    fetches_in_flight: usize,
    /// Last settled status and error, restored when every in-flight fetch
    /// was cancelled.
    #[serde(skip)]
    settled: Option<(LoadStatus, Option<String>)>,
}

impl TasksState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.task(id).is_some()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filtered(&self, filter: TaskFilter) -> Vec<Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).cloned().collect()
    }

    /// `max(existing ids) + 1`, or 1 for an empty collection.
    pub fn next_id(&self) -> TaskId {
        self.tasks.iter().map(|t| t.id).max().map_or(1, |max| max + 1)
    }

    pub fn fetch_pending(&mut self) {
        if self.fetches_in_flight == 0 {
            self.settled = Some((self.status, self.error.take()));
        }
        self.fetches_in_flight += 1;
        self.status = LoadStatus::Loading;
        self.error = None;
    }

    /// Replace the collection with `todos`, in remote order.
    ///
    /// Ids already present keep their priority, deadline and description;
    /// unseen ids get a random priority and empty deadline/description.
    /// A repeated id in `todos` keeps only its first occurrence.
    pub fn fetch_fulfilled<R: Rng + ?Sized>(&mut self, todos: Vec<RemoteTodo>, rng: &mut R) {
        let mut previous: HashMap<TaskId, Task> =
            self.tasks.drain(..).map(|t| (t.id, t)).collect();
        let mut seen = HashSet::with_capacity(todos.len());
        let mut tasks = Vec::with_capacity(todos.len());

        for remote in todos {
            if !seen.insert(remote.id) {
                warn!(id = remote.id, "duplicate id in remote task list, skipping");
                continue;
            }
            let task = match previous.remove(&remote.id) {
                Some(mut existing) => {
                    existing.merge_remote(remote);
                    existing
                }
                None => Task::from_remote(remote, Priority::random(rng)),
            };
            tasks.push(task);
        }

        self.tasks = tasks;
        self.status = LoadStatus::Succeeded;
        self.fetch_settled();
    }

    pub fn fetch_rejected(&mut self, message: String) {
        self.status = LoadStatus::Failed;
        self.error = Some(message);
        self.fetch_settled();
    }

    /// Undo `fetch_pending` for a fetch that was abandoned.
    ///
    /// While another fetch is still in flight the status stays `Loading`.
    /// Once none is left, the status and error from before the fetches are
    /// restored, unless a fetch has settled in the meantime.
    pub fn fetch_cancelled(&mut self) {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
        if self.fetches_in_flight > 0 {
            return;
        }
        if let Some((status, error)) = self.settled.take() {
            if self.status == LoadStatus::Loading {
                self.status = status;
                self.error = error;
            }
        }
    }

    fn fetch_settled(&mut self) {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
        self.settled = if self.fetches_in_flight > 0 {
            Some((self.status, self.error.clone()))
        } else {
            None
        };
    }

    /// Append `task`. An id that collides with an existing task is replaced
    /// by `next_id()`. Returns the id the task was stored under.
    pub fn task_added(&mut self, mut task: Task) -> TaskId {
        if self.contains(task.id) {
            let predicted = self.next_id();
            warn!(
                remote_id = task.id,
                local_id = predicted,
                "created task id already in use, assigning next free id"
            );
            task.id = predicted;
        }
        let id = task.id;
        self.tasks.push(task);
        id
    }

    /// Returns false when no task has `id`.
    pub fn task_updated(&mut self, id: TaskId, changes: &TaskChanges) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.apply(changes);
                true
            }
            None => false,
        }
    }

    /// Overwrite remote-backed fields of the matching task.
    pub fn task_refreshed(&mut self, remote: RemoteTodo) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == remote.id) {
            Some(task) => {
                task.merge_remote(remote);
                true
            }
            None => false,
        }
    }

    /// Returns false when no task has `id`.
    pub fn task_deleted(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Flip `completed` locally. Returns the new value, or `None` on no match.
    pub fn toggle_completion(&mut self, id: TaskId) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        task.completed = !task.completed;
        Some(task.completed)
    }

    pub fn mutation_rejected(&mut self, message: String) {
        self.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn remote(id: TaskId, todo: &str) -> RemoteTodo {
        RemoteTodo {
            id,
            todo: todo.to_string(),
            completed: false,
            user_id: 5,
        }
    }

    fn loaded(ids: &[TaskId]) -> TasksState {
        let mut state = TasksState::new();
        state.fetch_pending();
        state.fetch_fulfilled(ids.iter().map(|&id| remote(id, "t")).collect(), &mut rng());
        state
    }

    #[test]
    fn initial_state_is_idle_and_empty() {
        let state = TasksState::new();
        assert_eq!(state.status(), LoadStatus::Idle);
        assert!(state.tasks().is_empty());
        assert!(state.error().is_none());
    }

    #[test]
    fn fetch_pending_clears_error() {
        let mut state = TasksState::new();
        state.fetch_rejected("Failed to fetch tasks".to_string());
        state.fetch_pending();
        assert_eq!(state.status(), LoadStatus::Loading);
        assert!(state.error().is_none());
    }

    #[test]
    fn fetch_fulfilled_decorates_remote_records() {
        let mut state = TasksState::new();
        state.fetch_pending();
        state.fetch_fulfilled(vec![remote(1, "A")], &mut rng());

        assert_eq!(state.status(), LoadStatus::Succeeded);
        let task = state.task(1).unwrap();
        assert_eq!(task.todo, "A");
        assert!(!task.completed);
        assert_eq!(task.user_id, 5);
        assert!(Priority::ALL.contains(&task.priority));
        assert_eq!(task.deadline, "");
        assert_eq!(task.description, "");
    }

    #[test]
    fn fetch_fulfilled_keeps_remote_order_and_ids() {
        let state = loaded(&[3, 1, 2]);
        let ids: Vec<_> = state.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn fetch_fulfilled_drops_repeated_ids() {
        let mut state = TasksState::new();
        state.fetch_fulfilled(vec![remote(1, "first"), remote(1, "second")], &mut rng());
        assert_eq!(state.tasks().len(), 1);
        assert_eq!(state.task(1).unwrap().todo, "first");
    }

    #[test]
    fn refetch_preserves_local_fields_of_known_ids() {
        let mut state = loaded(&[1, 2]);
        state.task_updated(
            1,
            &TaskChanges {
                priority: Some(Priority::High),
                deadline: Some("2099-01-01".to_string()),
                description: Some("keep me".to_string()),
                ..Default::default()
            },
        );

        state.fetch_pending();
        let mut renamed = remote(1, "renamed");
        renamed.completed = true;
        state.fetch_fulfilled(vec![renamed, remote(3, "new")], &mut rng());

        let task = state.task(1).unwrap();
        assert_eq!(task.todo, "renamed");
        assert!(task.completed);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.deadline, "2099-01-01");
        assert_eq!(task.description, "keep me");
        assert!(state.task(2).is_none());
        assert!(state.task(3).is_some());
    }

    #[test]
    fn fetch_rejected_sets_failed() {
        let mut state = loaded(&[1]);
        state.fetch_pending();
        state.fetch_rejected("Failed to fetch tasks".to_string());
        assert_eq!(state.status(), LoadStatus::Failed);
        assert_eq!(state.error(), Some("Failed to fetch tasks"));
        assert_eq!(state.tasks().len(), 1);
    }

    #[test]
    fn cancelled_first_fetch_returns_to_idle() {
        let mut state = TasksState::new();
        state.fetch_pending();
        state.fetch_cancelled();
        assert_eq!(state.status(), LoadStatus::Idle);
        assert_eq!(state, TasksState::new());
    }

    #[test]
    fn cancelled_refetch_restores_succeeded() {
        let mut state = loaded(&[1]);
        state.fetch_pending();
        state.fetch_cancelled();
        assert_eq!(state.status(), LoadStatus::Succeeded);
        assert_eq!(state.tasks().len(), 1);
    }

    #[test]
    fn cancelled_retry_restores_failure_and_error() {
        let mut state = TasksState::new();
        state.fetch_pending();
        state.fetch_rejected("Failed to fetch tasks".to_string());
        state.fetch_pending();
        assert!(state.error().is_none());
        state.fetch_cancelled();
        assert_eq!(state.status(), LoadStatus::Failed);
        assert_eq!(state.error(), Some("Failed to fetch tasks"));
    }

    #[test]
    fn cancelling_one_of_two_fetches_keeps_loading() {
        let mut state = loaded(&[1]);
        state.fetch_pending();
        state.fetch_pending();
        state.fetch_cancelled();
        assert_eq!(state.status(), LoadStatus::Loading);
        state.fetch_fulfilled(vec![remote(1, "t"), remote(2, "u")], &mut rng());
        assert_eq!(state.status(), LoadStatus::Succeeded);
        assert_eq!(state.tasks().len(), 2);
    }

    #[test]
    fn cancel_after_other_fetch_settled_keeps_new_outcome() {
        let mut state = TasksState::new();
        state.fetch_pending();
        state.fetch_pending();
        state.fetch_rejected("Failed to fetch tasks".to_string());
        state.fetch_pending();
        state.fetch_cancelled();
        assert_eq!(state.status(), LoadStatus::Loading);
        state.fetch_cancelled();
        assert_eq!(state.status(), LoadStatus::Failed);
        assert_eq!(state.error(), Some("Failed to fetch tasks"));
    }

    #[test]
    fn task_added_appends() {
        let mut state = loaded(&[1, 2]);
        let id = state.task_added(Task::from_remote(remote(10, "new"), Priority::Low));
        assert_eq!(id, 10);
        assert_eq!(state.tasks().last().unwrap().id, 10);
        assert_eq!(state.status(), LoadStatus::Succeeded);
    }

    #[test]
    fn task_added_with_taken_id_gets_next_id() {
        let mut state = loaded(&[1, 7, 3]);
        let id = state.task_added(Task::from_remote(remote(3, "dup"), Priority::Low));
        assert_eq!(id, 8);
        let ids: Vec<_> = state.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 7, 3, 8]);
    }

    #[test]
    fn next_id_on_empty_is_one() {
        assert_eq!(TasksState::new().next_id(), 1);
    }

    #[test]
    fn task_updated_merges_all_fields() {
        let mut state = loaded(&[1]);
        let applied = state.task_updated(
            1,
            &TaskChanges {
                todo: Some("Edited".to_string()),
                completed: Some(true),
                priority: Some(Priority::Medium),
                deadline: Some("2030-05-05".to_string()),
                description: Some("d".to_string()),
            },
        );
        assert!(applied);
        let task = state.task(1).unwrap();
        assert_eq!(task.todo, "Edited");
        assert!(task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.deadline, "2030-05-05");
        assert_eq!(task.description, "d");
    }

    #[test]
    fn task_updated_unknown_id_is_noop() {
        let mut state = loaded(&[1, 50]);
        let before = state.clone();
        let applied = state.task_updated(
            999_999,
            &TaskChanges {
                todo: Some("ghost".to_string()),
                ..Default::default()
            },
        );
        assert!(!applied);
        assert_eq!(state, before);
    }

    #[test]
    fn task_deleted_twice_is_noop_second_time() {
        let mut state = loaded(&[1, 2]);
        assert!(state.task_deleted(1));
        let after_first = state.clone();
        assert!(!state.task_deleted(1));
        assert_eq!(state, after_first);
        assert!(state.error().is_none());
    }

    #[test]
    fn toggle_twice_restores_completion() {
        let mut state = loaded(&[1]);
        assert_eq!(state.toggle_completion(1), Some(true));
        assert_eq!(state.toggle_completion(1), Some(false));
        assert!(!state.task(1).unwrap().completed);
    }

    #[test]
    fn toggle_unknown_id_is_noop() {
        let mut state = loaded(&[1]);
        let before = state.clone();
        assert_eq!(state.toggle_completion(2), None);
        assert_eq!(state, before);
    }

    #[test]
    fn mutation_rejected_keeps_status() {
        let mut state = loaded(&[1]);
        state.mutation_rejected("Failed to add task".to_string());
        assert_eq!(state.status(), LoadStatus::Succeeded);
        assert_eq!(state.error(), Some("Failed to add task"));
    }

    #[test]
    fn task_refreshed_keeps_local_fields() {
        let mut state = loaded(&[1]);
        state.task_updated(
            1,
            &TaskChanges {
                description: Some("local".to_string()),
                ..Default::default()
            },
        );
        assert!(state.task_refreshed(remote(1, "server text")));
        assert!(!state.task_refreshed(remote(2, "unknown")));
        let task = state.task(1).unwrap();
        assert_eq!(task.todo, "server text");
        assert_eq!(task.description, "local");
    }

    #[test]
    fn filtered_by_completion() {
        let mut state = loaded(&[1, 2, 3]);
        state.toggle_completion(2);
        let done: Vec<_> = state.filtered(TaskFilter::Completed).iter().map(|t| t.id).collect();
        let open: Vec<_> = state.filtered(TaskFilter::Pending).iter().map(|t| t.id).collect();
        assert_eq!(done, vec![2]);
        assert_eq!(open, vec![1, 3]);
        assert_eq!(state.filtered(TaskFilter::All).len(), 3);
    }
}
