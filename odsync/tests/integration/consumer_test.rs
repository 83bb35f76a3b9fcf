use odsync::query::{BindValue, StatementKind};
use odsync::queue::memory::MemoryQueue;
use odsync::state::memory::MemorySyncState;
use odsync::store::memory::MemoryStore;
use odsync::test_utils::event::{create_event, event, message_body, update_event};
use odsync::test_utils::pipeline::create_pipeline;
use odsync::test_utils::schema::{
    OFFERING_OBJECT_TYPE, OFFERING_TABLE, PARTY_OBJECT_TYPE, PARTY_TABLE, all_columns,
};
use odsync::test_utils::test_queue_wrapper::TestQueueWrapper;
use odsync::types::Action;
use serde_json::json;
use telemetry::tracing::init_test_tracing;

fn text(value: &str) -> Option<BindValue> {
    Some(BindValue::Text(value.to_string()))
}

#[tokio::test(flavor = "multi_thread")]
async fn redelivered_create_updates_instead_of_failing() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    let body = message_body(&[create_event(
        PARTY_OBJECT_TYPE,
        "a01",
        json!({"Id": "a01", "Name": "Acme", "Active__c": true}),
    )]);
    queue.push(body.clone()).await;
    queue.push(body).await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(2).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    let rows = store.rows(PARTY_TABLE).await;
    assert_eq!(rows.len(), 1);
    let row = &rows["a01"];
    assert_eq!(row.get("name"), Some(&text("Acme")));
    assert_eq!(row.get("active__c"), Some(&Some(BindValue::Integer(1))));

    let kinds: Vec<StatementKind> = store
        .executed()
        .await
        .iter()
        .map(|statement| statement.kind)
        .collect();
    assert_eq!(kinds, vec![StatementKind::Insert, StatementKind::Update]);
}

#[tokio::test(flavor = "multi_thread")]
async fn null_fields_are_omitted_on_insert_and_cleared_on_update() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue
        .push(message_body(&[create_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Id": "a01", "Name": null, "Active__c": false}),
        )]))
        .await;
    queue
        .push(message_body(&[update_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Id": "a01", "Name": null}),
        )]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(2).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    let executed = store.executed().await;
    assert_eq!(executed.len(), 2);

    let insert = &executed[0];
    assert_eq!(insert.kind, StatementKind::Insert);
    assert!(insert.value("name").is_none());
    assert!(!insert.sql.contains("name"));

    let update = &executed[1];
    assert_eq!(update.kind, StatementKind::Update);
    assert_eq!(update.value("name"), Some(&None));
    assert_eq!(update.value("active__c"), Some(&None));
    assert!(update.sql.contains("name = NULL"));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_message_is_acknowledged_and_dropped() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue.push("{\"not\": \"an array\"").await;
    queue
        .push(message_body(&[create_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Acme"}),
        )]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(2).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    let activity = wrapped.activity().await;
    assert!(activity.sent.is_empty());
    assert_eq!(
        activity.acknowledged_bodies()[0],
        "{\"not\": \"an array\"".to_string()
    );
    assert_eq!(queue.pending().await, 0);
    assert_eq!(queue.in_flight().await, 0);
    assert!(store.row(PARTY_TABLE, "a01").await.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_action_is_skipped() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue
        .push(message_body(&[
            event(
                Action::Other("X".to_string()),
                "jdoe",
                PARTY_OBJECT_TYPE,
                "a01",
                json!({"Name": "Ignored"}),
            ),
            create_event(PARTY_OBJECT_TYPE, "a02", json!({"Name": "Acme"})),
        ]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(1).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    assert!(store.row(PARTY_TABLE, "a01").await.is_none());
    assert!(store.row(PARTY_TABLE, "a02").await.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn store_failure_is_logged_and_message_still_acknowledged() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    store.fail_table(PARTY_TABLE).await;
    queue
        .push(message_body(&[create_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Acme"}),
        )]))
        .await;
    queue
        .push(message_body(&[create_event(
            OFFERING_OBJECT_TYPE,
            "b01",
            json!({"Name": "Gold", "Start_Date__c": "2019-03-01"}),
        )]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(2).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    assert!(store.rows(PARTY_TABLE).await.is_empty());
    assert_eq!(
        store
            .row(OFFERING_TABLE, "b01")
            .await
            .unwrap()
            .get("start_date__c"),
        Some(&text("2019-03-01"))
    );
    assert!(wrapped.activity().await.sent.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_object_type_is_fatal_for_the_message_only() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue
        .push(message_body(&[create_event("Unmapped__c", "z01", json!({}))]))
        .await;
    queue
        .push(message_body(&[create_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Name": "Acme"}),
        )]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(2).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    assert_eq!(store.executed().await.len(), 1);
    assert!(wrapped.activity().await.sent.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unparsable_created_date_does_not_drop_the_message() {
    init_test_tracing();

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(all_columns());
    queue
        .push(format!(
            r#"[{{"userName": "jdoe", "action": "C", "objectId": "a01", "objectType": "{PARTY_OBJECT_TYPE}", "createdDate": "not a date", "fullPayload": {{"Id": "a01", "Name": "Acme"}}}}]"#
        ))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(1).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    let row = store.row(PARTY_TABLE, "a01").await.unwrap();
    assert_eq!(row.get("name"), Some(&text("Acme")));
}
