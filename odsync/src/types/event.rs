use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Originator marking events produced by a bulk load rather than by a user.
pub const BULK_USER_NAME: &str = "batch";

/// Field-name to value mapping carried by an event.
pub type FieldValues = Map<String, Value>;

/// Mutation kind of a [`ChangeCaptureEvent`], transmitted as a single-letter code.
///
/// Codes other than `C`, `U` and `D` are preserved in [`Action::Other`] so that the router can
/// log and skip them instead of rejecting the whole message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Create,
    Update,
    Delete,
    Other(String),
}

impl Action {
    pub fn code(&self) -> &str {
        match self {
            Action::Create => "C",
            Action::Update => "U",
            Action::Delete => "D",
            Action::Other(code) => code,
        }
    }
}

impl From<String> for Action {
    fn from(code: String) -> Self {
        match code.as_str() {
            "C" => Action::Create,
            "U" => Action::Update,
            "D" => Action::Delete,
            _ => Action::Other(code),
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.code().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One create, update or delete notification on a source object.
///
/// A queue message body is a JSON array of these. The `fullPayload` map is the authoritative
/// field set written to the store, the old and new value maps are informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCaptureEvent {
    /// Originator of the change, [`BULK_USER_NAME`] for bulk loads.
    #[serde(default)]
    pub user_name: String,
    pub action: Action,
    /// Stable identifier of the mutated record.
    pub object_id: String,
    /// Logical type name of the source object, mapped to the target table.
    pub object_type: String,
    #[serde(default)]
    pub object_name: String,
    #[serde(
        default,
        rename = "createdDate",
        deserialize_with = "deserialize_created_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub old_field_values: FieldValues,
    #[serde(default)]
    pub new_field_values: FieldValues,
    #[serde(default)]
    pub full_payload: FieldValues,
}

impl ChangeCaptureEvent {
    /// Returns `true` for a create produced by a bulk load.
    pub fn is_bulk_create(&self) -> bool {
        self.user_name == BULK_USER_NAME && self.action == Action::Create
    }
}

/// Parses a message body into its ordered list of events.
pub fn parse_events(body: &str) -> serde_json::Result<Vec<ChangeCaptureEvent>> {
    serde_json::from_str(body)
}

/// Returns `true` when every event of the batch is a bulk create.
///
/// An empty batch qualifies, which makes it a no-op on the bulk path.
pub fn is_bulk_create_batch(events: &[ChangeCaptureEvent]) -> bool {
    events.iter().all(ChangeCaptureEvent::is_bulk_create)
}

/// Accepts RFC 3339 text, ISO-8601 text with a compact offset, or epoch milliseconds.
///
/// The time is informational only, so a value in any other shape is logged and dropped instead
/// of failing the whole message.
fn deserialize_created_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    let created_time = match &value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Some(Value::String(text)) => parse_timestamp(text),
        Some(_) => None,
    };

    if created_time.is_none() {
        warn!(created_date = ?value, "ignoring unparsable createdDate");
    }

    Ok(created_time)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
