use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;

/// A todo as stored and returned by the server, DummyJSON field names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub todo: String,
    pub completed: bool,
    pub user_id: u64,
}

/// `GET /todos` envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct TodoList {
    pub todos: Vec<Todo>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

/// `DELETE /todos/{id}` response: the removed record plus deletion markers.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedTodo {
    #[serde(flatten)]
    pub todo: Todo,
    pub is_deleted: bool,
    pub deleted_on: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub todo: String,
    #[serde(default)]
    pub completed: bool,
    pub user_id: u64,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub todo: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Default)]
pub struct Store {
    todos: BTreeMap<u64, Todo>,
    next_id: u64,
}

impl Store {
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        let todos: BTreeMap<u64, Todo> = todos.into_iter().map(|t| (t.id, t)).collect();
        let next_id = todos.keys().next_back().copied().unwrap_or(0);
        Self { todos, next_id }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Store::default())
}

/// Router over a pre-populated store.
pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/todos", get(list_todos))
        .route("/todos/add", post(create_todo))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock todo server listening");
    }
    axum::serve(listener, app).await
}

async fn list_todos(State(db): State<Db>) -> Json<TodoList> {
    let store = db.read().await;
    let todos: Vec<Todo> = store.todos.values().cloned().collect();
    let total = todos.len() as u64;
    Json(TodoList {
        todos,
        total,
        skip: 0,
        limit: total,
    })
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> (StatusCode, Json<Todo>) {
    let mut store = db.write().await;
    let todo = Todo {
        id: store.allocate_id(),
        todo: input.todo,
        completed: input.completed,
        user_id: input.user_id,
    };
    store.todos.insert(todo.id, todo.clone());
    (StatusCode::CREATED, Json(todo))
}

async fn get_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Todo>, StatusCode> {
    let store = db.read().await;
    store.todos.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut store = db.write().await;
    let todo = store.todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(text) = input.todo {
        todo.todo = text;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<DeletedTodo>, StatusCode> {
    let mut store = db.write().await;
    let todo = store.todos.remove(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(DeletedTodo {
        todo,
        is_deleted: true,
        deleted_on: chrono::Utc::now().to_rfc3339(),
    }))
}
