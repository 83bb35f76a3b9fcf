use std::future::Future;

use crate::error::SyncResult;
use crate::query::Statement;
use crate::schema::ColumnRow;

/// Gateway to the relational store receiving the changes.
///
/// Every call is its own unit of work: [`Store::execute`] commits a single statement and
/// [`Store::execute_batch`] commits all statements or none. A write rejected because the row
/// already exists must fail with [`crate::error::ErrorKind::UniqueViolation`] so that the engine
/// can tell it apart from every other failure.
pub trait Store {
    /// Introspects `(table, column, data type)` rows of every table owned by `schema_owner`.
    fn load_columns(
        &self,
        schema_owner: &str,
    ) -> impl Future<Output = SyncResult<Vec<ColumnRow>>> + Send;

    /// Executes one statement in its own transaction and returns the affected row count.
    fn execute(&self, statement: &Statement) -> impl Future<Output = SyncResult<u64>> + Send;

    /// Executes all statements in a single transaction and returns the total affected row count.
    ///
    /// On failure nothing is applied.
    fn execute_batch(
        &self,
        statements: &[Statement],
    ) -> impl Future<Output = SyncResult<u64>> + Send;
}
