//! Client-side task state for the todo app.
//!
//! # Overview
//! Reconciles a local task collection with a remote todo API that only knows
//! `{id, todo, completed, userId}`. Priority, deadline and description are
//! local-only fields layered on top of the remote records.
//!
//! # Design
//! - `TodoClient` is stateless: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse`. It never touches the network.
//! - `Transport` performs the round-trip; `UreqTransport` is the default.
//! - `RemoteClient` pairs the two into async calls, one attempt each.
//! - `TasksState` holds the collection and its synchronous transitions.
//! - `TaskStore` owns the state and runs the async actions (fetch, add,
//!   update, delete) plus the local toggle.

pub mod client;
pub mod config;
pub mod date;
pub mod error;
pub mod http;
pub mod remote;
pub mod state;
pub mod store;
pub mod transport;
pub mod types;

pub use client::TodoClient;
pub use config::ClientConfig;
pub use error::{ActionError, ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use remote::RemoteClient;
pub use state::{LoadStatus, TasksState};
pub use store::TaskStore;
pub use tokio_util::sync::CancellationToken;
pub use transport::UreqTransport;
pub use types::{
    CreateTodo, NewTask, Priority, RemoteTodo, Task, TaskChanges, TaskFilter, TaskId, TodoList,
    UpdateTodo,
};
