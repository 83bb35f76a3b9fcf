use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::query::{BindValue, Statement, StatementKind};
use crate::schema::ColumnRow;
use crate::store::base::Store;

/// Column values of one stored row.
pub type Row = BTreeMap<String, Option<BindValue>>;

type Tables = HashMap<String, BTreeMap<String, Row>>;

#[derive(Debug)]
struct Inner {
    columns: Vec<ColumnRow>,
    tables: Tables,
    executed: Vec<Statement>,
    failing_tables: HashSet<String>,
}

impl Inner {
    fn apply(&mut self, statement: &Statement) -> SyncResult<u64> {
        if self.failing_tables.contains(&statement.table) {
            bail!(
                ErrorKind::DestinationQueryFailed,
                "Store operation failed",
                format!("table `{}` is configured to fail", statement.table)
            );
        }

        let rows = self.tables.entry(statement.table.clone()).or_default();
        let affected = match statement.kind {
            StatementKind::Insert => {
                if rows.contains_key(&statement.object_id) {
                    bail!(
                        ErrorKind::UniqueViolation,
                        "Store rejected a duplicate primary key",
                        format!("`{}` already exists in `{}`", statement.object_id, statement.table)
                    );
                }
                rows.insert(
                    statement.object_id.clone(),
                    statement.values.iter().cloned().collect(),
                );
                1
            }
            StatementKind::Update => match rows.get_mut(&statement.object_id) {
                Some(row) => {
                    for (column, value) in &statement.values {
                        row.insert(column.clone(), value.clone());
                    }
                    1
                }
                None => 0,
            },
            StatementKind::Delete => u64::from(rows.remove(&statement.object_id).is_some()),
        };

        self.executed.push(statement.clone());

        Ok(affected)
    }
}

/// In-memory [`Store`] for tests and local development.
///
/// Statements are applied structurally from their column values, without parsing SQL. Rows are
/// keyed by object id, which stands in for the primary key constraint. Batches are applied
/// atomically.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store whose introspection returns no tables.
    pub fn new() -> Self {
        Self::with_columns(Vec::new())
    }

    /// Creates an empty store whose introspection returns `columns`.
    pub fn with_columns(columns: Vec<ColumnRow>) -> Self {
        let inner = Inner {
            columns,
            tables: HashMap::new(),
            executed: Vec::new(),
            failing_tables: HashSet::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Makes every later statement against `table` fail with a non-recoverable error.
    pub async fn fail_table(&self, table: &str) {
        let mut inner = self.inner.lock().await;
        inner.failing_tables.insert(table.to_string());
    }

    pub async fn row(&self, table: &str, object_id: &str) -> Option<Row> {
        let inner = self.inner.lock().await;
        inner
            .tables
            .get(table)
            .and_then(|rows| rows.get(object_id))
            .cloned()
    }

    /// Returns the rows of `table` keyed by object id.
    pub async fn rows(&self, table: &str) -> BTreeMap<String, Row> {
        let inner = self.inner.lock().await;
        inner.tables.get(table).cloned().unwrap_or_default()
    }

    /// Returns every committed statement in execution order.
    pub async fn executed(&self) -> Vec<Statement> {
        let inner = self.inner.lock().await;
        inner.executed.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    async fn load_columns(&self, _schema_owner: &str) -> SyncResult<Vec<ColumnRow>> {
        let inner = self.inner.lock().await;
        Ok(inner.columns.clone())
    }

    async fn execute(&self, statement: &Statement) -> SyncResult<u64> {
        let mut inner = self.inner.lock().await;
        inner.apply(statement)
    }

    async fn execute_batch(&self, statements: &[Statement]) -> SyncResult<u64> {
        let mut inner = self.inner.lock().await;

        let tables_snapshot = inner.tables.clone();
        let executed_len = inner.executed.len();

        let mut rows_affected = 0;
        for statement in statements {
            match inner.apply(statement) {
                Ok(affected) => rows_affected += affected,
                Err(err) => {
                    debug!(table = %statement.table, "rolling back batch");
                    inner.tables = tables_snapshot;
                    inner.executed.truncate(executed_len);
                    return Err(err);
                }
            }
        }

        Ok(rows_affected)
    }
}
