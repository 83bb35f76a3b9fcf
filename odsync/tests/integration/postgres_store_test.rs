use config::shared::PgConnectionConfig;
use odsync::query::{QueryBuilder, StatementKind};
use odsync::schema::{FieldDefinition, ObjectDescribe, SchemaCache, generate_ddl};
use odsync::store::Store;
use odsync::store::postgres::PostgresStore;
use odsync::test_utils::database::{
    create_pg_database, drop_pg_database, local_pg_connection_config,
};
use odsync::test_utils::event::{create_event, update_event};
use odsync::test_utils::schema::PARTY_OBJECT_TYPE;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use telemetry::tracing::init_test_tracing;

const SCHEMA_OWNER: &str = "public";

fn field(name: &str, field_type: &str, length: u64) -> FieldDefinition {
    FieldDefinition {
        name: name.to_string(),
        field_type: field_type.to_string(),
        length,
        byte_length: length * 3,
        digits: 0,
    }
}

fn party_describe() -> ObjectDescribe {
    ObjectDescribe {
        name: PARTY_OBJECT_TYPE.to_string(),
        fields: vec![
            field("Id", "id", 18),
            field("Name", "string", 80),
            field("Active__c", "boolean", 0),
            field("CreatedDate", "datetime", 0),
            field("Start_Date__c", "date", 0),
            field("Notes__c", "textarea", 32768),
        ],
    }
}

/// Creates a database holding the party table, built from its generated DDL, plus a reserved
/// column and a table with quoted upper-case names.
async fn setup() -> Option<(PgConnectionConfig, PgPool, PostgresStore)> {
    init_test_tracing();

    let Some(config) = local_pg_connection_config() else {
        eprintln!("skipping: TESTS_DATABASE_HOST is not set");
        return None;
    };
    let pool = create_pg_database(&config).await;

    let ddl = generate_ddl(&party_describe()).unwrap();
    sqlx::query(&ddl).execute(&pool).await.unwrap();
    sqlx::query("alter table party__c add column _sync_ts timestamp(6) default now()")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(r#"create table "OFFERING__C" ("ID" varchar(18) primary key, "NAME" varchar(80))"#)
        .execute(&pool)
        .await
        .unwrap();

    let store = PostgresStore::from_pool(pool.clone());

    Some((config, pool, store))
}

async fn query_builder(store: &PostgresStore) -> QueryBuilder {
    let rows = store.load_columns(SCHEMA_OWNER).await.unwrap();
    QueryBuilder::new(Arc::new(SchemaCache::from_rows(rows).unwrap()))
}

async fn count_rows(pool: &PgPool, object_id: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as("select count(*) from party__c where id = $1")
        .bind(object_id)
        .fetch_one(pool)
        .await
        .unwrap();

    count
}

#[tokio::test(flavor = "multi_thread")]
async fn introspection_is_lower_cased_and_cache_skips_reserved_columns() {
    let Some((config, _pool, store)) = setup().await else {
        return;
    };

    let rows = store.load_columns(SCHEMA_OWNER).await.unwrap();

    assert!(rows.iter().all(|row| {
        row.table_name == row.table_name.to_lowercase()
            && row.column_name == row.column_name.to_lowercase()
            && row.data_type == row.data_type.to_lowercase()
    }));
    assert!(
        rows.iter()
            .any(|row| row.table_name == "offering__c" && row.column_name == "id")
    );
    assert!(
        rows.iter()
            .any(|row| row.table_name == "party__c" && row.column_name == "_sync_ts")
    );
    assert_eq!(rows.len(), 9);

    let cache = SchemaCache::from_rows(rows).unwrap();
    let party = cache.table("party__c").unwrap();
    let names: Vec<&str> = party.iter().map(|column| column.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["active__c", "createddate", "id", "name", "start_date__c", "notes__c"]
    );
    assert_eq!(party.data_type("notes__c"), Some("text"));
    assert_eq!(cache.table("offering__c").map(|table| table.len()), Some(2));

    drop_pg_database(&config).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn wrapped_placeholders_round_trip_typed_values() {
    let Some((config, pool, store)) = setup().await else {
        return;
    };
    let builder = query_builder(&store).await;

    let insert = builder
        .insert(&create_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({
                "Id": "a01",
                "Name": "Acme",
                "Active__c": true,
                "CreatedDate": "2019-03-01T10:15:30.250Z",
                "Start_Date__c": "2019-03-01",
                "Notes__c": "first note"
            }),
        ))
        .unwrap();
    assert_eq!(store.execute(&insert).await.unwrap(), 1);

    let row: (String, i64, String, String, String) = sqlx::query_as(
        r#"select name,
                  active__c::bigint,
                  to_char(createddate, 'YYYY-MM-DD"T"HH24:MI:SS.MS'),
                  to_char(start_date__c, 'YYYY-MM-DD'),
                  notes__c
           from party__c where id = $1"#,
    )
    .bind("a01")
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(
        row,
        (
            "Acme".to_string(),
            1,
            "2019-03-01T10:15:30.250".to_string(),
            "2019-03-01".to_string(),
            "first note".to_string(),
        )
    );

    let update = builder
        .update(&update_event(
            PARTY_OBJECT_TYPE,
            "a01",
            json!({"Id": "a01", "Name": "Renamed", "Active__c": 2.5}),
        ))
        .unwrap();
    assert_eq!(store.execute(&update).await.unwrap(), 1);

    let row: (String, String, Option<String>, Option<String>) = sqlx::query_as(
        "select name, active__c::text, createddate::text, notes__c from party__c where id = $1",
    )
    .bind("a01")
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row, ("Renamed".to_string(), "2.5".to_string(), None, None));

    let missing = builder
        .update(&update_event(PARTY_OBJECT_TYPE, "a02", json!({"Name": "Ghost"})))
        .unwrap();
    assert_eq!(store.execute(&missing).await.unwrap(), 0);

    drop_pg_database(&config).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_insert_is_reported_as_unique_violation() {
    let Some((config, pool, store)) = setup().await else {
        return;
    };
    let builder = query_builder(&store).await;

    let insert = builder
        .insert(&create_event(PARTY_OBJECT_TYPE, "a01", json!({"Name": "Acme"})))
        .unwrap();
    store.execute(&insert).await.unwrap();

    let err = store.execute(&insert).await.unwrap_err();

    assert!(err.is_unique_violation());
    assert_eq!(count_rows(&pool, "a01").await, 1);

    drop_pg_database(&config).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_batch_leaves_no_rows_behind() {
    let Some((config, pool, store)) = setup().await else {
        return;
    };
    let builder = query_builder(&store).await;

    let existing = builder
        .insert(&create_event(PARTY_OBJECT_TYPE, "a01", json!({"Name": "Existing"})))
        .unwrap();
    store.execute(&existing).await.unwrap();

    let batch = vec![
        builder
            .insert(&create_event(PARTY_OBJECT_TYPE, "a02", json!({"Name": "New"})))
            .unwrap(),
        builder
            .insert(&create_event(PARTY_OBJECT_TYPE, "a01", json!({"Name": "Duplicate"})))
            .unwrap(),
    ];
    assert!(batch.iter().all(|statement| statement.kind == StatementKind::Insert));

    let err = store.execute_batch(&batch).await.unwrap_err();

    assert!(err.is_unique_violation());
    assert_eq!(count_rows(&pool, "a02").await, 0);
    let (name,): (String,) = sqlx::query_as("select name from party__c where id = $1")
        .bind("a01")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "Existing");

    drop_pg_database(&config).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn update_of_key_only_table_reports_existing_row() {
    let Some((config, pool, store)) = setup().await else {
        return;
    };
    sqlx::query("create table keyonly__c (id varchar(18) primary key)")
        .execute(&pool)
        .await
        .unwrap();
    let builder = query_builder(&store).await;

    let insert = builder
        .insert(&create_event("KeyOnly__c", "k01", json!({})))
        .unwrap();
    store.execute(&insert).await.unwrap();

    let existing = builder
        .update(&update_event("KeyOnly__c", "k01", json!({})))
        .unwrap();
    let missing = builder
        .update(&update_event("KeyOnly__c", "k02", json!({})))
        .unwrap();

    assert_eq!(store.execute(&existing).await.unwrap(), 1);
    assert_eq!(store.execute(&missing).await.unwrap(), 0);

    drop_pg_database(&config).await;
}
