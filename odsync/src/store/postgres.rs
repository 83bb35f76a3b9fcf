use config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::SyncResult;
use crate::query::{BindValue, Statement};
use crate::schema::ColumnRow;
use crate::store::base::Store;

/// Duration after which idle connections are closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Introspects every base table of a schema, lower-casing all names.
const LOAD_COLUMNS_QUERY: &str = r#"
    select lower(c.table_name) as table_name,
           lower(c.column_name) as column_name,
           lower(c.data_type) as data_type
    from information_schema.columns c
    join information_schema.tables t
      on t.table_schema = c.table_schema
     and t.table_name = c.table_name
    where lower(t.table_schema) = lower($1)
      and t.table_type = 'BASE TABLE'
    order by 1, 2
"#;

/// [`Store`] backed by a Postgres connection pool.
///
/// The schema owner maps to a Postgres schema. Connections are opened lazily on first use and
/// closed after [`IDLE_TIMEOUT`] of inactivity.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over a lazily connected pool of at most `max_connections`.
    pub fn new(config: &PgConnectionConfig, max_connections: u32) -> Self {
        let pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(max_connections)
            .idle_timeout(Some(IDLE_TIMEOUT))
            .connect_lazy_with(config.with_db());

        Self { pool }
    }

    /// Creates a store over an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            BindValue::Integer(value) => query.bind(*value),
            BindValue::Float(value) => query.bind(*value),
            BindValue::Text(value) => query.bind(value.as_str()),
        };
    }

    query
}

impl Store for PostgresStore {
    async fn load_columns(&self, schema_owner: &str) -> SyncResult<Vec<ColumnRow>> {
        info!(schema_owner, "introspecting store schema");

        let rows: Vec<(String, String, String)> = sqlx::query_as(LOAD_COLUMNS_QUERY)
            .bind(schema_owner)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(table_name, column_name, data_type)| ColumnRow {
                table_name,
                column_name,
                data_type,
            })
            .collect())
    }

    async fn execute(&self, statement: &Statement) -> SyncResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = bind_params(sqlx::query(&statement.sql), &statement.params)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            table = %statement.table,
            object_id = %statement.object_id,
            rows_affected = result.rows_affected(),
            "statement executed"
        );

        Ok(result.rows_affected())
    }

    async fn execute_batch(&self, statements: &[Statement]) -> SyncResult<u64> {
        let mut tx = self.pool.begin().await?;

        let mut rows_affected = 0;
        for statement in statements {
            // An error drops the transaction, which rolls it back.
            let result = bind_params(sqlx::query(&statement.sql), &statement.params)
                .execute(&mut *tx)
                .await?;
            rows_affected += result.rows_affected();
        }

        tx.commit().await?;

        debug!(
            statements = statements.len(),
            rows_affected, "batch executed"
        );

        Ok(rows_affected)
    }
}
