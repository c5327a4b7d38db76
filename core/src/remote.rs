//! Async remote client: `TodoClient` requests executed through a `Transport`.
//!
//! Each operation is exactly one round-trip. There is no retry and no timeout;
//! any failure is returned to the caller as-is.

use tracing::debug;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{CreateTodo, RemoteTodo, TaskId, UpdateTodo};

#[derive(Debug, Clone)]
pub struct RemoteClient<T> {
    client: TodoClient,
    transport: T,
}

impl<T: Transport> RemoteClient<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn list_tasks(&self) -> Result<Vec<RemoteTodo>, ApiError> {
        let response = self.send(self.client.build_list_todos()).await?;
        self.client.parse_list_todos(response)
    }

    pub async fn get_task(&self, id: TaskId) -> Result<RemoteTodo, ApiError> {
        let response = self.send(self.client.build_get_todo(id)).await?;
        self.client.parse_get_todo(response)
    }

    pub async fn create_task(&self, input: &CreateTodo) -> Result<RemoteTodo, ApiError> {
        let response = self.send(self.client.build_create_todo(input)?).await?;
        self.client.parse_create_todo(response)
    }

    pub async fn update_task(&self, id: TaskId, input: &UpdateTodo) -> Result<RemoteTodo, ApiError> {
        let response = self.send(self.client.build_update_todo(id, input)?).await?;
        self.client.parse_update_todo(response)
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        let response = self.send(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method.as_str();
        let path = request.path.clone();
        debug!(method, path = %path, "sending request");
        let response = self.transport.execute(request).await?;
        debug!(method, path = %path, status = response.status, "received response");
        Ok(response)
    }
}
