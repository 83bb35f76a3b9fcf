use std::collections::HashMap;
use std::fmt;

use tracing::info;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};

/// Prefix of system-internal columns that are never sync targets.
const RESERVED_COLUMN_PREFIX: &str = "_";

/// Timestamp pattern of payload values bound to timestamp columns.
const TIMESTAMP_PATTERN: &str = r#"YYYY-MM-DD"T"HH24:MI:SS.MS"Z""#;

/// Date pattern of payload values bound to date columns.
const DATE_PATTERN: &str = "YYYY-MM-DD";

/// One row returned by store introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

impl ColumnRow {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Classification of a column data type, driving ordering and placeholder rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataTypeKind {
    /// Any type whose name starts with `timestamp`.
    Timestamp,
    /// Exactly `date`.
    Date,
    /// Character or binary large objects, ordered after every other column.
    LargeObject,
    Plain,
}

impl DataTypeKind {
    /// Classifies a lower-case data type name.
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type {
            "date" => DataTypeKind::Date,
            "text" | "bytea" | "xml" => DataTypeKind::LargeObject,
            other if other.starts_with("timestamp") => DataTypeKind::Timestamp,
            _ => DataTypeKind::Plain,
        }
    }

    pub fn is_large_object(&self) -> bool {
        matches!(self, DataTypeKind::LargeObject)
    }

    /// Renders the placeholder for the bind parameter at `index` (1-based).
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            DataTypeKind::Timestamp => format!("TO_TIMESTAMP(${index}, '{TIMESTAMP_PATTERN}')"),
            DataTypeKind::Date => format!("TO_DATE(${index}, '{DATE_PATTERN}')"),
            DataTypeKind::LargeObject | DataTypeKind::Plain => format!("${index}"),
        }
    }
}

/// A column of a cached table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
    pub data_type: String,
    pub kind: DataTypeKind,
}

/// Columns of one table in statement order, plus a name lookup.
#[derive(Debug, Clone, Default)]
pub struct TableColumns {
    ordered: Vec<ColumnMetadata>,
    index: HashMap<String, usize>,
}

impl TableColumns {
    fn insert(&mut self, column: ColumnMetadata) {
        if self.index.contains_key(&column.name) {
            return;
        }
        self.index.insert(column.name.clone(), self.ordered.len());
        self.ordered.push(column);
    }

    /// Orders non large-object columns first, each group by name.
    fn seal(&mut self) {
        self.ordered.sort_by(|a, b| {
            (a.kind.is_large_object(), &a.name).cmp(&(b.kind.is_large_object(), &b.name))
        });
        self.index = self
            .ordered
            .iter()
            .enumerate()
            .map(|(position, column)| (column.name.clone(), position))
            .collect();
    }

    /// Iterates the columns in statement order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.ordered.iter()
    }

    pub fn get(&self, column_name: &str) -> Option<&ColumnMetadata> {
        self.index
            .get(column_name)
            .and_then(|position| self.ordered.get(*position))
    }

    pub fn data_type(&self, column_name: &str) -> Option<&str> {
        self.get(column_name).map(|column| column.data_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Read-only snapshot of the target schema, loaded once at startup.
///
/// Table, column and type names are lower-cased. Columns starting with `_` are left out.
/// The cache is never mutated after construction, share it through an `Arc`.
#[derive(Clone, Default)]
pub struct SchemaCache {
    tables: HashMap<String, TableColumns>,
}

impl SchemaCache {
    /// Builds the cache from introspection rows, failing when they describe no table.
    pub fn from_rows<I>(rows: I) -> SyncResult<Self>
    where
        I: IntoIterator<Item = ColumnRow>,
    {
        let mut tables: HashMap<String, TableColumns> = HashMap::new();

        for row in rows {
            let column_name = row.column_name.to_lowercase();
            if column_name.starts_with(RESERVED_COLUMN_PREFIX) {
                continue;
            }

            let data_type = row.data_type.to_lowercase();
            let kind = DataTypeKind::from_data_type(&data_type);
            tables
                .entry(row.table_name.to_lowercase())
                .or_default()
                .insert(ColumnMetadata {
                    name: column_name,
                    data_type,
                    kind,
                });
        }

        tables.retain(|_, columns| !columns.is_empty());
        if tables.is_empty() {
            bail!(
                ErrorKind::EmptySchema,
                "Schema introspection returned no tables",
                "check that the configured schema owner owns the target tables"
            );
        }

        for columns in tables.values_mut() {
            columns.seal();
        }

        info!(tables = tables.len(), "loaded column metadata");

        Ok(Self { tables })
    }

    pub fn table(&self, table_name: &str) -> Option<&TableColumns> {
        self.tables.get(table_name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCache")
            .field("tables", &self.tables.len())
            .finish()
    }
}
