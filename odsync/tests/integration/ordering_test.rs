use odsync::query::{BindValue, StatementKind};
use odsync::queue::memory::MemoryQueue;
use odsync::state::memory::MemorySyncState;
use odsync::store::memory::MemoryStore;
use odsync::test_utils::event::{create_event, delete_event, message_body, update_event};
use odsync::test_utils::pipeline::create_pipeline;
use odsync::test_utils::schema::{PARTY_OBJECT_TYPE, PARTY_TABLE, all_columns};
use odsync::test_utils::test_queue_wrapper::TestQueueWrapper;
use serde_json::json;
use std::time::Duration;
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn update_without_create_is_retried_then_dropped() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    let state = MemorySyncState::new();
    let body = message_body(&[update_event(
        PARTY_OBJECT_TYPE,
        "a01",
        json!({"Name": "Orphan"}),
    )]);
    queue.push(body.clone()).await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), state.clone());
    let acks = wrapped.wait_for_acks(3).await;
    pipeline.start().await.unwrap();
    acks.notified().await;

    // Give a further re-publish the chance to show up.
    tokio::time::sleep(Duration::from_millis(600)).await;
    pipeline.shutdown_and_wait().await.unwrap();

    let activity = wrapped.activity().await;
    assert_eq!(activity.sent.len(), 2);
    assert_eq!(activity.received.len(), 3);
    assert!(
        activity
            .redelivery_gaps(&body)
            .iter()
            .all(|gap| *gap >= Duration::from_millis(250))
    );
    assert_eq!(state.retry_counters().await.get(&body), Some(&3));
    assert_eq!(queue.pending().await, 0);
    assert!(store.rows(PARTY_TABLE).await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn retried_update_succeeds_once_create_lands() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue
        .push(message_body(&[update_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Updated"}),
        )]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let first_ack = wrapped.wait_for_acks(1).await;
    let all_acks = wrapped.wait_for_acks(3).await;
    pipeline.start().await.unwrap();

    first_ack.notified().await;
    queue
        .push(message_body(&[create_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Created"}),
        )]))
        .await;
    all_acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(
        store.row(PARTY_TABLE, "a01").await.unwrap().get("name"),
        Some(&Some(BindValue::Text("Updated".to_string())))
    );
    assert_eq!(wrapped.activity().await.sent.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_update_after_delete_is_discarded() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    let state = MemorySyncState::new();
    queue
        .push(message_body(&[create_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Acme"}),
        )]))
        .await;
    queue
        .push(message_body(&[delete_event(PARTY_OBJECT_TYPE, "a01")]))
        .await;
    queue
        .push(message_body(&[update_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Stale"}),
        )]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), state.clone());
    let acks = wrapped.wait_for_acks(3).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    let kinds: Vec<StatementKind> = store
        .executed()
        .await
        .iter()
        .map(|statement| statement.kind)
        .collect();
    assert_eq!(kinds, vec![StatementKind::Insert, StatementKind::Delete]);
    assert!(state.deleted_ids().await.contains("a01"));
    assert!(wrapped.activity().await.sent.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_of_missing_object_is_a_noop() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    let state = MemorySyncState::new();
    queue
        .push(message_body(&[delete_event(PARTY_OBJECT_TYPE, "a01")]))
        .await;
    queue
        .push(message_body(&[create_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Acme"}),
        )]))
        .await;
    queue
        .push(message_body(&[update_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Acme Corp"}),
        )]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), state.clone());
    let acks = wrapped.wait_for_acks(3).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    assert!(state.deleted_ids().await.is_empty());
    assert_eq!(
        store.row(PARTY_TABLE, "a01").await.unwrap().get("name"),
        Some(&Some(BindValue::Text("Acme Corp".to_string())))
    );
}
