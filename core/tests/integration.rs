//! Full task lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every store action
//! through `UreqTransport` over real HTTP. Validates that request building,
//! response parsing and state reconciliation agree with the server's schema.

use mock_server::{app_with, Store, Todo};
use tasks_core::{
    ActionError, ApiError, CancellationToken, ClientConfig, LoadStatus, Priority, TaskChanges,
    TaskFilter, TaskStore, UreqTransport,
};

async fn start_server(seed: Vec<Todo>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::serve(listener, app_with(Store::with_todos(seed))));
    format!("http://{addr}")
}

fn seed() -> Vec<Todo> {
    (1..=3)
        .map(|id| Todo {
            id,
            todo: format!("Seeded {id}"),
            completed: id == 2,
            user_id: 5,
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn task_lifecycle() {
    let base_url = start_server(seed()).await;
    let config = ClientConfig {
        base_url,
        ..Default::default()
    };
    let store = TaskStore::from_config(&config, UreqTransport::new());
    let cancel = CancellationToken::new();

    // Step 1: fetch the seeded tasks.
    store.fetch(&cancel).await.unwrap();
    assert_eq!(store.status().await, LoadStatus::Succeeded);
    let ids: Vec<u64> = store.tasks().await.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(store.filtered(TaskFilter::Completed).await.len(), 1);

    // Step 2: add a task with local fields.
    let mut input = config.new_task("Buy milk");
    input.priority = Some(Priority::High);
    input.deadline = "2099-01-01".to_string();
    let added = store.add(input, &cancel).await.unwrap();
    assert_eq!(added.id, 4);
    assert_eq!(added.user_id, 5);
    assert_eq!(added.priority, Priority::High);

    // Step 3: the server knows the task, without local fields.
    assert!(store.refresh_task(4, &cancel).await.unwrap());
    let refreshed = store.task(4).await.unwrap();
    assert_eq!(refreshed.todo, "Buy milk");
    assert_eq!(refreshed.deadline, "2099-01-01");

    // Step 4: update text and description.
    store
        .update(
            4,
            TaskChanges {
                todo: Some("Buy oat milk".to_string()),
                description: Some("two cartons".to_string()),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap();
    let updated = store.task(4).await.unwrap();
    assert_eq!(updated.todo, "Buy oat milk");
    assert_eq!(updated.description, "two cartons");

    // Step 5: sync completion to the server.
    assert_eq!(store.sync_completion(4, &cancel).await.unwrap(), Some(true));

    // Step 6: refetch keeps local fields and reflects server state.
    store.fetch(&cancel).await.unwrap();
    let task = store.task(4).await.unwrap();
    assert_eq!(task.todo, "Buy oat milk");
    assert!(task.completed);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.description, "two cartons");

    // Step 7: delete, twice.
    store.delete(4, &cancel).await.unwrap();
    store.delete(4, &cancel).await.unwrap();
    assert!(store.task(4).await.is_none());
    assert!(store.error().await.is_none());

    // Step 8: the server no longer has it.
    store.fetch(&cancel).await.unwrap();
    assert_eq!(store.tasks().await.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_unknown_to_server_is_still_edited_and_deleted_locally() {
    let base_url = start_server(seed()).await;
    let config = ClientConfig {
        base_url,
        ..Default::default()
    };
    let store = TaskStore::from_config(&config, UreqTransport::new());
    let cancel = CancellationToken::new();
    store.fetch(&cancel).await.unwrap();

    // Remove task 3 behind the store's back.
    store.remote().delete_task(3).await.unwrap();

    let err = store
        .update(
            3,
            TaskChanges {
                completed: Some(true),
                ..Default::default()
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::UpdateFailed(ApiError::NotFound)));
    assert_eq!(store.error().await.as_deref(), Some("Failed to update task"));
    assert!(store.task(3).await.unwrap().completed);

    // Deleting it is then purely local.
    store.delete(3, &cancel).await.unwrap();
    assert!(store.task(3).await.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_fails_fetch() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ClientConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        ..Default::default()
    };
    let store = TaskStore::from_config(&config, UreqTransport::new());

    let err = store.fetch(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, ActionError::FetchFailed(ApiError::Transport(_))));
    assert_eq!(store.status().await, LoadStatus::Failed);
    assert_eq!(store.error().await.as_deref(), Some("Failed to fetch tasks"));
}
