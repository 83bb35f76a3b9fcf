use serde_json::Value;

/// A value bound to a statement placeholder.
///
/// Booleans never reach the store: the target has no boolean type, so they are bound as the
/// integers `1` and `0`.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    /// Converts a payload value, returning [`None`] for JSON `null`.
    ///
    /// Arrays and objects are bound as their JSON text.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(BindValue::Integer(i64::from(*flag))),
            Value::Number(number) => Some(match number.as_i64() {
                Some(integer) => BindValue::Integer(integer),
                None => BindValue::Float(number.as_f64().unwrap_or_default()),
            }),
            Value::String(text) => Some(BindValue::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => Some(BindValue::Text(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
}

/// A rendered statement together with its bind values.
///
/// `sql` uses positional `$n` placeholders matching `params`. `values` restates the written
/// columns in statement order, with `None` for columns explicitly set to `NULL`, so that stores
/// which do not speak SQL can apply the statement structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub table: String,
    pub object_id: String,
    pub sql: String,
    pub params: Vec<BindValue>,
    pub values: Vec<(String, Option<BindValue>)>,
}

impl Statement {
    /// Returns the value written to `column`, if the statement writes it.
    pub fn value(&self, column: &str) -> Option<&Option<BindValue>> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}
