use odsync::query::{BindValue, QueryBuilder};
use odsync::queue::memory::MemoryQueue;
use odsync::schema::{
    ColumnRow, MAX_IDENTIFIER_LENGTH, SchemaCache, TABLE_NAME_SUFFIX, TRUNCATED_COLUMN_MARKER,
    column_name_for_field, table_name_for_object_type,
};
use odsync::state::memory::MemorySyncState;
use odsync::store::memory::MemoryStore;
use odsync::test_utils::event::{create_event, message_body};
use odsync::test_utils::pipeline::create_pipeline;
use odsync::test_utils::test_queue_wrapper::TestQueueWrapper;
use serde_json::{Value, json};
use std::sync::Arc;
use telemetry::tracing::init_test_tracing;

const LONG_OBJECT_TYPE: &str = "Very_Long_Custom_Object_Name__c";
const LONG_FIELD: &str = "Some_Extremely_Long_Custom_Field_Name__c";

#[test]
fn large_object_columns_are_enumerated_last() {
    let cache = SchemaCache::from_rows([
        ColumnRow::new("t__c", "id", "varchar"),
        ColumnRow::new("t__c", "zeta", "varchar"),
        ColumnRow::new("t__c", "alpha", "text"),
        ColumnRow::new("t__c", "beta", "varchar"),
    ])
    .unwrap();

    let names: Vec<&str> = cache
        .table("t__c")
        .unwrap()
        .iter()
        .map(|column| column.name.as_str())
        .collect();
    assert_eq!(names, vec!["beta", "id", "zeta", "alpha"]);

    let update = QueryBuilder::new(Arc::new(cache))
        .update(&create_event("T__c", "x", json!({})))
        .unwrap();
    assert_eq!(
        update.sql,
        "UPDATE t__c SET beta = NULL, zeta = NULL, alpha = NULL WHERE id = $1"
    );
}

#[test]
fn long_names_are_shortened_deterministically() {
    let table = table_name_for_object_type(LONG_OBJECT_TYPE);
    assert!(table.len() <= MAX_IDENTIFIER_LENGTH);
    assert!(table.ends_with(TABLE_NAME_SUFFIX));
    assert_eq!(table, table_name_for_object_type(LONG_OBJECT_TYPE));

    let column = column_name_for_field(LONG_FIELD);
    assert!(column.len() <= MAX_IDENTIFIER_LENGTH - 1);
    assert!(column.ends_with(TRUNCATED_COLUMN_MARKER));
    assert_eq!(column, column_name_for_field(LONG_FIELD));
}

#[tokio::test(flavor = "multi_thread")]
async fn long_names_resolve_end_to_end() {
    init_test_tracing();

    let table = table_name_for_object_type(LONG_OBJECT_TYPE);
    let column = column_name_for_field(LONG_FIELD);

    let queue = MemoryQueue::new();
    let wrapped = TestQueueWrapper::wrap(queue.clone());
    let store = MemoryStore::with_columns(vec![
        ColumnRow::new(table.to_uppercase(), "ID", "CHARACTER VARYING"),
        ColumnRow::new(table.to_uppercase(), column.to_uppercase(), "CHARACTER VARYING"),
    ]);
    let mut payload = serde_json::Map::new();
    payload.insert(LONG_FIELD.to_string(), json!("value"));
    queue
        .push(message_body(&[create_event(
            LONG_OBJECT_TYPE,
            "a01",
            Value::Object(payload),
        )]))
        .await;

    let mut pipeline = create_pipeline(store.clone(), wrapped.clone(), MemorySyncState::new());
    let acks = wrapped.wait_for_acks(1).await;
    pipeline.start().await.unwrap();
    acks.notified().await;
    pipeline.shutdown_and_wait().await.unwrap();

    let row = store.row(&table, "a01").await.unwrap();
    assert_eq!(
        row.get(&column),
        Some(&Some(BindValue::Text("value".to_string())))
    );
}
