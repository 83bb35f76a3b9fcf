use odsync::query::{BindValue, StatementKind};
use odsync::queue::memory::MemoryQueue;
use odsync::state::memory::MemorySyncState;
use odsync::store::memory::MemoryStore;
use odsync::test_utils::event::{bulk_create_event, create_event, message_body};
use odsync::test_utils::pipeline::create_pipeline;
use odsync::test_utils::schema::{PARTY_OBJECT_TYPE, PARTY_TABLE, all_columns};
use odsync::test_utils::test_queue_wrapper::TestQueueWrapper;
use serde_json::json;
use telemetry::tracing::init_test_tracing;

fn name(value: &str) -> Option<BindValue> {
    Some(BindValue::Text(value.to_string()))
}

#[tokio::test(flavor = "multi_thread")]
async fn bulk_batch_is_applied_as_one_unit() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue
        .push(message_body(&[
            bulk_create_event(PARTY_OBJECT_TYPE, "a01", json!({"Name": "One"})),
            bulk_create_event(PARTY_OBJECT_TYPE, "a02", json!({"Name": "Two"})),
        ]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(1).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(store.rows(PARTY_TABLE).await.len(), 2);
    assert!(
        store
            .executed()
            .await
            .iter()
            .all(|statement| statement.kind == StatementKind::Insert)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn bulk_batch_with_duplicate_is_reapplied_individually() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue
        .push(message_body(&[bulk_create_event(
            PARTY_OBJECT_TYPE,
            "a02",
            json!({"Name": "Two"}),
        )]))
        .await;
    queue
        .push(message_body(&[
            bulk_create_event(PARTY_OBJECT_TYPE, "a01", json!({"Name": "One"})),
            bulk_create_event(PARTY_OBJECT_TYPE, "a02", json!({"Name": "Two again"})),
            bulk_create_event(PARTY_OBJECT_TYPE, "a03", json!({"Name": "Three"})),
        ]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(2).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    let rows = store.rows(PARTY_TABLE).await;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows["a01"].get("name"), Some(&name("One")));
    assert_eq!(rows["a02"].get("name"), Some(&name("Two again")));
    assert_eq!(rows["a03"].get("name"), Some(&name("Three")));

    // The rolled back bulk attempt leaves no trace, each event is applied exactly once.
    let applied: Vec<(StatementKind, String)> = store
        .executed()
        .await
        .into_iter()
        .map(|statement| (statement.kind, statement.object_id))
        .collect();
    assert_eq!(
        applied,
        vec![
            (StatementKind::Insert, "a02".to_string()),
            (StatementKind::Insert, "a01".to_string()),
            (StatementKind::Update, "a02".to_string()),
            (StatementKind::Insert, "a03".to_string()),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn mixed_batch_is_processed_individually() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue
        .push(message_body(&[
            bulk_create_event(PARTY_OBJECT_TYPE, "a01", json!({"Name": "One"})),
            create_event(PARTY_OBJECT_TYPE, "a02", json!({"Name": "Two"})),
        ]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(1).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(store.rows(PARTY_TABLE).await.len(), 2);
    assert_eq!(store.executed().await.len(), 2);
}
