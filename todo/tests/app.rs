//! End-to-end tests of `TodoApp` against in-memory and file storage

use pocket_todo::persistence::{decode_snapshot, encode_snapshot};
use pocket_todo::{
    LoadPhase, PersistenceOutcome, TODOS_KEY, Todo, TodoAction, TodoApp, TodoEnvironment, TodoId,
    TodoReducer, TodoState, TodoStats, WriteOutcome,
};
use pocket_todo_runtime::{Store, StoreConfig};
use pocket_todo_storage::FileKeyValueStore;
use pocket_todo_testing::mocks::TEST_EPOCH_MILLIS;
use pocket_todo_testing::{FaultyKeyValueStore, InMemoryKeyValueStore, ManualClock, test_clock};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

async fn start(storage: &InMemoryKeyValueStore) -> TodoApp {
    TodoApp::start(Arc::new(storage.clone()), Arc::new(test_clock())).await
}

fn stored(storage: &InMemoryKeyValueStore) -> Vec<Todo> {
    decode_snapshot(&storage.value(TODOS_KEY).unwrap()).unwrap()
}

#[tokio::test]
async fn adding_to_empty_list() {
    let storage = InMemoryKeyValueStore::new();
    let app = start(&storage).await;
    assert_eq!(app.phase().await, LoadPhase::Ready);
    assert_eq!(app.summary().await, None);

    app.add("Buy milk").await.unwrap();

    let todos = app.todos().await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].text(), "Buy milk");
    assert!(!todos[0].is_completed());
    assert_eq!(
        app.stats().await,
        TodoStats {
            total: 1,
            completed: 0,
            pending: 1
        }
    );

    app.flush(TIMEOUT).await.unwrap();
    assert_eq!(stored(&storage), todos);
}

#[tokio::test]
async fn newest_todo_comes_first() {
    let storage = InMemoryKeyValueStore::new();
    let app = start(&storage).await;

    app.add("A").await.unwrap();
    app.add("B").await.unwrap();

    let texts: Vec<String> = app.todos().await.iter().map(|t| t.text().to_string()).collect();
    assert_eq!(texts, ["B", "A"]);
}

#[tokio::test]
async fn add_toggle_delete_leaves_empty_list() {
    let storage = InMemoryKeyValueStore::new();
    let app = start(&storage).await;

    app.add("A").await.unwrap();
    let id = app.todos().await[0].id();
    app.toggle(id).await.unwrap();
    assert_eq!(app.stats().await.completed, 1);
    app.delete(id).await.unwrap();

    assert!(app.todos().await.is_empty());
    app.flush(TIMEOUT).await.unwrap();
    assert!(stored(&storage).is_empty());
    assert!(app.health().await.is_healthy());
}

#[tokio::test]
async fn blank_and_unknown_inputs_do_not_write() {
    let storage = InMemoryKeyValueStore::new();
    let app = start(&storage).await;
    app.flush(TIMEOUT).await.unwrap();
    let writes_after_start = storage.writes();

    app.add("   ").await.unwrap();
    app.toggle(TodoId::new(42)).await.unwrap();
    app.delete(TodoId::new(42)).await.unwrap();
    app.flush(TIMEOUT).await.unwrap();

    assert!(app.todos().await.is_empty());
    assert_eq!(storage.writes(), writes_after_start);
}

#[tokio::test]
async fn stored_list_is_loaded_at_start() {
    let storage = InMemoryKeyValueStore::new().with_entry(
        TODOS_KEY,
        r#"[{"id":2,"text":"Walk dog","completed":true},{"id":1,"text":"Buy milk"}]"#,
    );
    let app = start(&storage).await;

    assert_eq!(
        app.todos().await,
        vec![
            Todo::new(TodoId::new(2), "Walk dog").with_completed(true),
            Todo::new(TodoId::new(1), "Buy milk"),
        ]
    );
    assert_eq!(app.health().await.last_load, PersistenceOutcome::Ok);
}

#[tokio::test]
async fn malformed_value_starts_empty_and_is_not_clobbered() {
    let storage = InMemoryKeyValueStore::new().with_entry(TODOS_KEY, "{ definitely not a list");
    let app = start(&storage).await;

    assert_eq!(app.phase().await, LoadPhase::Ready);
    assert!(app.todos().await.is_empty());
    let health = app.health().await;
    assert!(matches!(health.last_load, PersistenceOutcome::Failed { .. }));
    assert_eq!(storage.writes(), 0);
    assert_eq!(storage.value(TODOS_KEY).as_deref(), Some("{ definitely not a list"));

    app.add("Fresh start").await.unwrap();
    app.flush(TIMEOUT).await.unwrap();
    assert_eq!(stored(&storage).len(), 1);
}

#[tokio::test]
async fn load_is_only_honored_once() {
    let storage = InMemoryKeyValueStore::new();
    let app = start(&storage).await;
    app.add("Kept").await.unwrap();

    let _ = storage
        .clone()
        .with_entry(TODOS_KEY, r#"[{"id":9,"text":"Other"}]"#);
    app.store().send(TodoAction::Load).await.unwrap();
    app.flush(TIMEOUT).await.unwrap();

    assert_eq!(app.todos().await[0].text(), "Kept");
    assert_eq!(app.todos().await.len(), 1);
}

#[tokio::test]
async fn write_failures_are_recorded_not_raised() {
    let inner = InMemoryKeyValueStore::new();
    let storage = FaultyKeyValueStore::new(inner.clone());
    let app = TodoApp::start(Arc::new(storage.clone()), Arc::new(test_clock())).await;

    storage.fail_writes(true);
    app.add("Unsaved").await.unwrap();
    app.flush(TIMEOUT).await.unwrap();

    assert_eq!(app.todos().await.len(), 1);
    let health = app.health().await;
    assert!(!health.is_healthy());
    assert_eq!(health.failed_writes, 1);
    assert!(health.last_error().is_some());

    storage.fail_writes(false);
    app.add("Saved").await.unwrap();
    app.flush(TIMEOUT).await.unwrap();

    assert!(app.health().await.is_healthy());
    let texts: Vec<String> = decode_snapshot(&inner.value(TODOS_KEY).unwrap())
        .unwrap()
        .iter()
        .map(|t| t.text().to_string())
        .collect();
    assert_eq!(texts, ["Saved", "Unsaved"]);
}

#[tokio::test]
async fn read_failure_starts_empty() {
    let storage = FaultyKeyValueStore::new(InMemoryKeyValueStore::new());
    storage.fail_reads(true);
    let app = TodoApp::start(Arc::new(storage.clone()), Arc::new(test_clock())).await;

    assert_eq!(app.phase().await, LoadPhase::Ready);
    assert!(app.todos().await.is_empty());
    assert_eq!(
        app.health().await.last_error(),
        Some("storage error: Storage unavailable: injected read failure")
    );
}

#[tokio::test]
async fn slow_early_write_never_overwrites_newer_snapshot() {
    let inner = InMemoryKeyValueStore::new();
    let storage = FaultyKeyValueStore::new(inner.clone());
    let app = TodoApp::start(Arc::new(storage.clone()), Arc::new(test_clock())).await;

    storage.delay_next_writes([Duration::from_millis(50), Duration::ZERO, Duration::ZERO]);
    app.add("First").await.unwrap();
    app.add("Second").await.unwrap();
    app.add("Third").await.unwrap();
    app.flush(TIMEOUT).await.unwrap();

    let snapshot = decode_snapshot(&inner.value(TODOS_KEY).unwrap()).unwrap();
    assert_eq!(snapshot, app.todos().await);
    let health = app.health().await;
    assert!(health.is_healthy());
    assert_eq!(health.last_applied_write, Some(4));
}

#[tokio::test]
async fn snapshot_older_than_stored_one_is_discarded() {
    let storage = InMemoryKeyValueStore::new();
    let env = TodoEnvironment::new(Arc::new(test_clock()), Arc::new(storage.clone()));
    let writer = env.writer().clone();
    let store = Store::new(TodoState::ready(vec![]), TodoReducer::new(), env);

    let newest = vec![Todo::new(TodoId::new(99), "Newest")];
    let outcome = writer.write(5, encode_snapshot(&newest).unwrap()).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Written);

    let mut actions = store.subscribe_actions();
    store.send(TodoAction::Add { text: "Older".into() }).await.unwrap();

    let action = tokio::time::timeout(TIMEOUT, actions.recv()).await.unwrap().unwrap();
    assert_eq!(action, TodoAction::SaveDiscarded { seq: 1 });
    store.wait_for_idle(TIMEOUT).await.unwrap();

    assert_eq!(stored(&storage), newest);
    assert_eq!(storage.writes(), 1);
    assert_eq!(writer.last_applied().await, Some(5));
    let health = store.state(|s| s.health().clone()).await;
    assert_eq!(health.last_write, PersistenceOutcome::Unknown);
    assert_eq!(health.failed_writes, 0);
}

#[tokio::test]
async fn ids_strictly_increase_even_when_clock_stalls_or_steps_back() {
    let clock = ManualClock::at_millis(TEST_EPOCH_MILLIS);
    let storage = InMemoryKeyValueStore::new();
    let app = TodoApp::start(Arc::new(storage), Arc::new(clock.clone())).await;

    app.add("A").await.unwrap();
    app.add("B").await.unwrap();
    clock.set_millis(TEST_EPOCH_MILLIS - 1_000);
    app.add("C").await.unwrap();
    clock.set_millis(TEST_EPOCH_MILLIS + 1_000);
    app.add("D").await.unwrap();

    let ids: Vec<i64> = app.todos().await.iter().map(|t| t.id().get()).collect();
    assert_eq!(
        ids,
        [
            TEST_EPOCH_MILLIS + 1_000,
            TEST_EPOCH_MILLIS + 2,
            TEST_EPOCH_MILLIS + 1,
            TEST_EPOCH_MILLIS,
        ]
    );
}

#[tokio::test]
async fn save_outcomes_are_broadcast() {
    let storage = InMemoryKeyValueStore::new();
    let app = start(&storage).await;
    let mut actions = app.store().subscribe_actions();

    app.add("Watched").await.unwrap();

    let action = tokio::time::timeout(TIMEOUT, actions.recv()).await.unwrap().unwrap();
    assert_eq!(action, TodoAction::Saved { seq: 2 });
}

#[tokio::test]
async fn shutdown_drains_writes_and_rejects_changes() {
    let inner = InMemoryKeyValueStore::new();
    let storage = FaultyKeyValueStore::new(inner.clone());
    let app = TodoApp::start(Arc::new(storage.clone()), Arc::new(test_clock())).await;

    storage.delay_next_writes([Duration::from_millis(30)]);
    app.add("Last words").await.unwrap();
    app.shutdown(TIMEOUT).await.unwrap();

    assert_eq!(decode_snapshot(&inner.value(TODOS_KEY).unwrap()).unwrap().len(), 1);
    assert!(app.add("Too late").await.is_err());
}

#[tokio::test]
async fn change_made_while_loading_is_saved_by_shutdown() {
    let inner = InMemoryKeyValueStore::new();
    let storage = FaultyKeyValueStore::new(inner.clone());
    storage.delay_next_reads([Duration::from_millis(200)]);
    let app = TodoApp::start_with(
        Arc::new(storage.clone()),
        Arc::new(test_clock()),
        StoreConfig::default(),
        Duration::from_millis(10),
    )
    .await;
    assert_eq!(app.phase().await, LoadPhase::Loading);

    app.add("Important").await.unwrap();
    app.shutdown(TIMEOUT).await.unwrap();

    assert_eq!(app.phase().await, LoadPhase::Ready);
    let value = inner.value(TODOS_KEY).unwrap();
    assert!(value.contains("Important"));
    assert_eq!(decode_snapshot(&value).unwrap(), app.todos().await);
}

#[tokio::test]
async fn list_survives_restart_with_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pocket-todo.json");

    let first = TodoApp::start(Arc::new(FileKeyValueStore::new(&path)), Arc::new(test_clock())).await;
    first.add("Buy milk").await.unwrap();
    first.add("Walk dog").await.unwrap();
    let id = first.todos().await[1].id();
    first.toggle(id).await.unwrap();
    first.shutdown(TIMEOUT).await.unwrap();
    let before = first.todos().await;

    let second = TodoApp::start(Arc::new(FileKeyValueStore::new(&path)), Arc::new(test_clock())).await;
    assert_eq!(second.todos().await, before);

    second.add("Call mom").await.unwrap();
    let newest = second.todos().await[0].id();
    assert!(before.iter().all(|t| t.id() < newest));
}
