use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::schema::naming::{shorten_field_name, table_name_for_object_type};

/// Name of the source field that becomes the primary key.
const PRIMARY_KEY_FIELD: &str = "Id";

/// Longest `textarea` still stored as a bounded `varchar` rather than `text`.
const MAX_INLINE_TEXT_LENGTH: u64 = 4000;

/// Length of source identifiers and references.
const ID_LENGTH: u64 = 18;

/// Description of a source object, as returned by the remote describe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescribe {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// One field of an [`ObjectDescribe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub byte_length: u64,
    #[serde(default)]
    pub digits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: String,
    pub is_primary_key: bool,
}

/// Postgres table derived from an [`ObjectDescribe`].
///
/// Names are lower-cased, matching what schema introspection reports for unquoted identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Maps every field of `describe` to a column.
    ///
    /// Fails on the first field whose type has no mapping.
    pub fn from_describe(describe: &ObjectDescribe) -> SyncResult<Self> {
        let columns = describe
            .fields
            .iter()
            .map(ColumnDefinition::from_field)
            .collect::<SyncResult<Vec<_>>>()?;

        Ok(Self {
            name: table_name_for_object_type(&describe.name),
            columns,
        })
    }

    /// Returns the comma separated primary key column names.
    pub fn primary_key(&self) -> SyncResult<String> {
        let keys: Vec<&str> = self
            .columns
            .iter()
            .filter(|column| column.is_primary_key)
            .map(|column| column.name.as_str())
            .collect();

        if keys.is_empty() {
            bail!(
                ErrorKind::MissingPrimaryKey,
                "Table has no primary key column",
                self.name.clone()
            );
        }

        Ok(keys.join(","))
    }

    /// Renders the `CREATE TABLE` statement.
    pub fn to_ddl(&self) -> SyncResult<String> {
        let primary_key = self.primary_key()?;

        let mut ddl = format!("CREATE TABLE {}\n(\n", self.name);
        for column in &self.columns {
            // Writing into a String never fails.
            let _ = writeln!(ddl, "\t{} {},", column.name, column.data_type);
        }
        let _ = write!(ddl, "\tPRIMARY KEY({primary_key})\n);");

        Ok(ddl)
    }
}

impl ColumnDefinition {
    pub fn from_field(field: &FieldDefinition) -> SyncResult<Self> {
        Ok(Self {
            name: shorten_field_name(&field.name).to_lowercase(),
            data_type: column_data_type(field)?,
            is_primary_key: field.name == PRIMARY_KEY_FIELD,
        })
    }
}

fn column_data_type(field: &FieldDefinition) -> SyncResult<String> {
    let data_type = match field.field_type.as_str() {
        "id" | "reference" => format!("varchar({ID_LENGTH})"),
        "string" | "picklist" | "url" => format!("varchar({})", field.length),
        // Booleans are stored as 1/0.
        "boolean" | "double" | "percent" | "currency" => "numeric".to_string(),
        "datetime" => "timestamp(6)".to_string(),
        "date" => "date".to_string(),
        "textarea" if field.length <= MAX_INLINE_TEXT_LENGTH => {
            format!("varchar({MAX_INLINE_TEXT_LENGTH})")
        }
        "textarea" => "text".to_string(),
        other => bail!(
            ErrorKind::UnsupportedFieldType,
            "Field type has no column mapping",
            format!("field `{}` has type `{other}`", field.name)
        ),
    };

    Ok(data_type)
}

/// Renders the `CREATE TABLE` statement for a source object description.
pub fn generate_ddl(describe: &ObjectDescribe) -> SyncResult<String> {
    TableDefinition::from_describe(describe)?.to_ddl()
}
