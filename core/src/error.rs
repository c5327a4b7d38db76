//! Error types for the remote client and the task store.
//!
//! # Design
//! `ApiError` carries the full detail of a failed remote call. The store never
//! exposes that detail through its state: each action wraps the cause in an
//! `ActionError` whose `Display` is a fixed message, and only that message is
//! written into `TasksState::error`. The cause stays reachable via `source()`.

use thiserror::Error;

/// Errors returned by `TodoClient` parse methods and by transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A create response did not carry a usable id.
    #[error("task creation failed: id not returned")]
    CreationFailed,

    /// The request never produced a response (connection, DNS, I/O).
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// True when the server produced a response, whatever its status or body.
    /// Only `Transport` and `Serialization` mean the request never landed.
    pub fn has_response(&self) -> bool {
        !matches!(self, ApiError::Transport(_) | ApiError::Serialization(_))
    }
}

/// Outcome of a failed store action.
///
/// The `Display` text is what the store records in its `error` slot.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Failed to fetch tasks")]
    FetchFailed(#[source] ApiError),

    #[error("Failed to add task")]
    AddFailed(#[source] ApiError),

    #[error("Failed to update task")]
    UpdateFailed(#[source] ApiError),

    #[error("Failed to delete task")]
    DeleteFailed(#[source] ApiError),

    /// The action's cancellation token fired before the remote call resolved.
    #[error("Operation cancelled")]
    Cancelled,
}

impl ActionError {
    /// The underlying remote failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ActionError::FetchFailed(e)
            | ActionError::AddFailed(e)
            | ActionError::UpdateFailed(e)
            | ActionError::DeleteFailed(e) => Some(e),
            ActionError::Cancelled => None,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TODO_USER_ID {value:?}: {reason}")]
    InvalidUserId { value: String, reason: String },

    #[error("TODO_API_URL must not be empty")]
    EmptyBaseUrl,
}
