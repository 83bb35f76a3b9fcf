use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ErrorKind, SyncResult};
use crate::query::statement::{BindValue, Statement, StatementKind};
use crate::schema::{SchemaCache, TableColumns, column_name_for_field, table_name_for_object_type};
use crate::sync_error;
use crate::types::ChangeCaptureEvent;

/// Column holding the object identifier in every target table.
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Renders events into statements using the cached target schema.
///
/// Payload fields are mapped to column names and matched against the table's cached columns.
/// Fields the table does not know are ignored. A table or key column missing from the cache means
/// source and target schemas have drifted and is reported as an error.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    schema: Arc<SchemaCache>,
}

impl QueryBuilder {
    pub fn new(schema: Arc<SchemaCache>) -> Self {
        Self { schema }
    }

    /// Builds a sparse `INSERT` writing only the columns with a non-null payload value.
    ///
    /// The key column is bound from the event's object id when the payload does not carry it.
    pub fn insert(&self, event: &ChangeCaptureEvent) -> SyncResult<Statement> {
        let (table, columns) = self.resolve_table(event)?;
        let mut payload = map_payload(event, columns);
        payload
            .entry(PRIMARY_KEY_COLUMN.to_string())
            .or_insert_with(|| BindValue::Text(event.object_id.clone()));

        let mut names = Vec::new();
        let mut placeholders = Vec::new();
        let mut params = Vec::new();
        let mut values = Vec::new();

        for column in columns.iter() {
            let Some(value) = payload.remove(&column.name) else {
                continue;
            };

            params.push(value.clone());
            names.push(column.name.as_str());
            placeholders.push(column.kind.placeholder(params.len()));
            values.push((column.name.clone(), Some(value)));
        }

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        );
        debug!(%sql, "generated insert");

        Ok(Statement {
            kind: StatementKind::Insert,
            table,
            object_id: event.object_id.clone(),
            sql,
            params,
            values,
        })
    }

    /// Builds a full-state `UPDATE` restating every known column.
    ///
    /// Columns without a payload value are set to `NULL`. The key column is only used in the
    /// predicate and never rewritten.
    pub fn update(&self, event: &ChangeCaptureEvent) -> SyncResult<Statement> {
        let (table, columns) = self.resolve_table(event)?;
        let mut payload = map_payload(event, columns);

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        let mut values = Vec::new();

        for column in columns.iter() {
            if column.name == PRIMARY_KEY_COLUMN {
                continue;
            }

            match payload.remove(&column.name) {
                Some(value) => {
                    params.push(value.clone());
                    assignments.push(format!(
                        "{} = {}",
                        column.name,
                        column.kind.placeholder(params.len())
                    ));
                    values.push((column.name.clone(), Some(value)));
                }
                None => {
                    assignments.push(format!("{} = NULL", column.name));
                    values.push((column.name.clone(), None));
                }
            }
        }

        // A key-only table still needs a valid statement reporting whether the row exists.
        if assignments.is_empty() {
            assignments.push(format!("{PRIMARY_KEY_COLUMN} = {PRIMARY_KEY_COLUMN}"));
        }

        params.push(BindValue::Text(event.object_id.clone()));
        let sql = format!(
            "UPDATE {table} SET {} WHERE {PRIMARY_KEY_COLUMN} = ${}",
            assignments.join(", "),
            params.len()
        );
        debug!(%sql, "generated update");

        Ok(Statement {
            kind: StatementKind::Update,
            table,
            object_id: event.object_id.clone(),
            sql,
            params,
            values,
        })
    }

    /// Builds a `DELETE` on the key column.
    pub fn delete(&self, event: &ChangeCaptureEvent) -> SyncResult<Statement> {
        let (table, _) = self.resolve_table(event)?;

        let sql = format!("DELETE FROM {table} WHERE {PRIMARY_KEY_COLUMN} = $1");
        debug!(%sql, "generated delete");

        Ok(Statement {
            kind: StatementKind::Delete,
            table,
            object_id: event.object_id.clone(),
            sql,
            params: vec![BindValue::Text(event.object_id.clone())],
            values: Vec::new(),
        })
    }

    fn resolve_table(&self, event: &ChangeCaptureEvent) -> SyncResult<(String, &TableColumns)> {
        let table = table_name_for_object_type(&event.object_type);

        let columns = self.schema.table(&table).ok_or_else(|| {
            sync_error!(
                ErrorKind::MissingTableSchema,
                "Table not found in schema cache",
                format!("object type `{}` maps to `{table}`", event.object_type)
            )
        })?;

        if columns.get(PRIMARY_KEY_COLUMN).is_none() {
            return Err(sync_error!(
                ErrorKind::MissingColumnSchema,
                "Key column not found in schema cache",
                format!("table `{table}` has no `{PRIMARY_KEY_COLUMN}` column")
            ));
        }

        Ok((table, columns))
    }
}

/// Maps payload fields to cached columns, dropping nulls and unknown fields.
fn map_payload(event: &ChangeCaptureEvent, columns: &TableColumns) -> HashMap<String, BindValue> {
    let mut mapped = HashMap::with_capacity(event.full_payload.len());

    for (field, value) in &event.full_payload {
        let column = column_name_for_field(field);
        if columns.get(&column).is_none() {
            debug!(%field, %column, object_type = %event.object_type, "ignoring unmapped field");
            continue;
        }

        if let Some(value) = BindValue::from_json(value) {
            mapped.insert(column, value);
        }
    }

    mapped
}
