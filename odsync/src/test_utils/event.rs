use serde_json::Value;

use crate::types::{Action, BULK_USER_NAME, ChangeCaptureEvent, FieldValues};

/// Originator used for events that are not part of a bulk load.
pub const TEST_USER_NAME: &str = "jdoe";

/// Builds an event. `payload` must be a JSON object, anything else yields an empty payload.
pub fn event(
    action: Action,
    user_name: &str,
    object_type: &str,
    object_id: &str,
    payload: Value,
) -> ChangeCaptureEvent {
    let full_payload = match payload {
        Value::Object(map) => map,
        _ => FieldValues::new(),
    };

    ChangeCaptureEvent {
        user_name: user_name.to_string(),
        action,
        object_id: object_id.to_string(),
        object_type: object_type.to_string(),
        object_name: String::new(),
        created_time: None,
        old_field_values: FieldValues::new(),
        new_field_values: full_payload.clone(),
        full_payload,
    }
}

pub fn create_event(object_type: &str, object_id: &str, payload: Value) -> ChangeCaptureEvent {
    event(Action::Create, TEST_USER_NAME, object_type, object_id, payload)
}

pub fn bulk_create_event(object_type: &str, object_id: &str, payload: Value) -> ChangeCaptureEvent {
    event(Action::Create, BULK_USER_NAME, object_type, object_id, payload)
}

pub fn update_event(object_type: &str, object_id: &str, payload: Value) -> ChangeCaptureEvent {
    event(Action::Update, TEST_USER_NAME, object_type, object_id, payload)
}

pub fn delete_event(object_type: &str, object_id: &str) -> ChangeCaptureEvent {
    event(
        Action::Delete,
        TEST_USER_NAME,
        object_type,
        object_id,
        Value::Null,
    )
}

/// Serializes `events` into a message body.
pub fn message_body(events: &[ChangeCaptureEvent]) -> String {
    serde_json::to_string(events).expect("events always serialize")
}
