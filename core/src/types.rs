//! Domain types: remote DTOs and the locally decorated `Task`.
//!
//! # Design
//! The remote API only knows `{id, todo, completed, userId}`. `RemoteTodo`,
//! `CreateTodo` and `UpdateTodo` mirror that schema exactly, so nothing local
//! can leak onto the wire. `Task` adds the local-only fields (priority,
//! deadline, description) and is what the store holds.

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::date;

pub type TaskId = u64;

/// A todo record as returned by the remote API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTodo {
    pub id: TaskId,
    pub todo: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub user_id: u64,
}

/// Envelope returned by `GET /todos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoList {
    pub todos: Vec<RemoteTodo>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub todo: String,
    #[serde(default)]
    pub completed: bool,
    pub user_id: u64,
}

/// Request payload for updating an existing todo. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodo {
    pub fn is_empty(&self) -> bool {
        self.todo.is_none() && self.completed.is_none()
    }
}

/// Local-only task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Uniformly random priority.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// A task as held by the store: remote fields plus local-only decoration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(alias = "title")]
    pub todo: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub priority: Priority,
    /// `YYYY-MM-DD` or empty.
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub description: String,
}

impl Task {
    /// Decorate a remote record with default local fields.
    pub fn from_remote(remote: RemoteTodo, priority: Priority) -> Self {
        Self {
            id: remote.id,
            todo: remote.todo,
            completed: remote.completed,
            user_id: remote.user_id,
            priority,
            deadline: String::new(),
            description: String::new(),
        }
    }

    /// Overwrite the remote-backed fields, keeping local decoration.
    pub fn merge_remote(&mut self, remote: RemoteTodo) {
        self.todo = remote.todo;
        self.completed = remote.completed;
        self.user_id = remote.user_id;
    }

    pub fn apply(&mut self, changes: &TaskChanges) {
        if let Some(todo) = &changes.todo {
            self.todo = todo.clone();
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(deadline) = &changes.deadline {
            self.deadline = deadline.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
    }

    /// True when the deadline has passed and the task is still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && date::parse_deadline(&self.deadline).is_some_and(|d| d < today)
    }
}

/// Input for the add action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(alias = "title")]
    pub todo: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub user_id: u64,
    /// Randomly assigned when absent.
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub description: String,
}

impl NewTask {
    pub fn remote(&self) -> CreateTodo {
        CreateTodo {
            todo: self.todo.clone(),
            completed: self.completed,
            user_id: self.user_id,
        }
    }
}

/// Partial changes for the update action. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    #[serde(default, alias = "title")]
    pub todo: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskChanges {
    /// The subset of changes the remote API understands.
    pub fn remote(&self) -> UpdateTodo {
        UpdateTodo {
            todo: self.todo.clone(),
            completed: self.completed,
        }
    }
}

/// Completion filter for task lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}
