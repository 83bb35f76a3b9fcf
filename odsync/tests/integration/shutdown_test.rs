use odsync::queue::memory::MemoryQueue;
use odsync::state::memory::MemorySyncState;
use odsync::store::memory::MemoryStore;
use odsync::test_utils::event::{message_body, update_event};
use odsync::test_utils::pipeline::create_pipeline;
use odsync::test_utils::schema::{PARTY_OBJECT_TYPE, all_columns};
use odsync::test_utils::test_queue_wrapper::TestQueueWrapper;
use serde_json::json;
use std::time::Duration;
use telemetry::tracing::init_test_tracing;
use tokio::time::{Instant, timeout};

#[tokio::test(flavor = "multi_thread")]
async fn idle_pipeline_stops_promptly() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let mut pipeline = create_pipeline(
        MemoryStore::with_columns(all_columns()),
        wrapped.clone(),
        MemorySyncState::new(),
    );
    pipeline.start().await.unwrap();

    let started = Instant::now();
    timeout(Duration::from_secs(5), pipeline.shutdown_and_wait())
        .await
        .unwrap()
        .unwrap();

    // Shutdown cancels the long poll instead of waiting it out.
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(wrapped.shutdown_called().await);
    assert!(queue.is_shut_down().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_retries_are_published_before_stopping() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let body = message_body(&[update_event(
        PARTY_OBJECT_TYPE,
        "a01",
        json!({"Name": "Early"}),
    )]);
    queue.push(body.clone()).await;

    let mut pipeline = create_pipeline(
        MemoryStore::with_columns(all_columns()),
        wrapped.clone(),
        MemorySyncState::new(),
    );
    let acks = wrapped.wait_for_acks(1).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(queue.sent().await, vec![body]);
    assert_eq!(queue.pending().await, 1);
    assert!(wrapped.shutdown_called().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_cannot_start_twice() {
    init_test_tracing();

    let mut pipeline = create_pipeline(
        MemoryStore::with_columns(all_columns()),
        MemoryQueue::new(),
        MemorySyncState::new(),
    );
    pipeline.start().await.unwrap();

    assert!(pipeline.start().await.is_err());

    pipeline.shutdown_and_wait().await.unwrap();
}
