//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each CRUD operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! `RemoteClient` pairs the two with a `Transport`; this module never does I/O.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, RemoteTodo, TaskId, TodoList, UpdateTodo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

/// Create responses are checked for an id before being trusted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedTodo {
    #[serde(default)]
    id: Option<TaskId>,
    todo: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    user_id: u64,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/todos", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get_todo(&self, id: TaskId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/todos/{id}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/todos/add", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_update_todo(&self, id: TaskId, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Put,
            path: format!("{}/todos/{id}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_delete_todo(&self, id: TaskId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/todos/{id}", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<RemoteTodo>, ApiError> {
        let list: TodoList = parse_json(response)?;
        Ok(list.todos)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<RemoteTodo, ApiError> {
        parse_json(response)
    }

    /// Fails with `CreationFailed` when the server did not assign an id.
    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<RemoteTodo, ApiError> {
        let created: CreatedTodo = parse_json(response)?;
        match created.id {
            Some(id) if id != 0 => Ok(RemoteTodo {
                id,
                todo: created.todo,
                completed: created.completed,
                user_id: created.user_id,
            }),
            _ => Err(ApiError::CreationFailed),
        }
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<RemoteTodo, ApiError> {
        parse_json(response)
    }

    /// The response body is not inspected; callers use the id they asked for.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
