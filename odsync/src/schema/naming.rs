/// Longest identifier the target store accepts.
pub const MAX_IDENTIFIER_LENGTH: usize = 30;

/// Suffix appended to every target table name.
pub const TABLE_NAME_SUFFIX: &str = "__c";

/// Suffix stripped from over-long field names before truncation.
const CUSTOM_FIELD_SUFFIX: &str = "__c";

/// Marker appended to truncated column names.
pub const TRUNCATED_COLUMN_MARKER: &str = "_t";

/// Length kept from an over-long field name before [`TRUNCATED_COLUMN_MARKER`] is appended.
const TRUNCATED_COLUMN_PREFIX_LENGTH: usize = 27;

/// Maps a source object type to its target table name.
///
/// The name is lower-cased, cut to leave room for [`TABLE_NAME_SUFFIX`] within
/// [`MAX_IDENTIFIER_LENGTH`], then suffixed. Custom object types already ending in `__c` keep the
/// same suffix, short ones lose their last three characters to it.
pub fn table_name_for_object_type(object_type: &str) -> String {
    let lowered = object_type.to_lowercase();
    let keep = lowered
        .chars()
        .count()
        .min(MAX_IDENTIFIER_LENGTH)
        .saturating_sub(TABLE_NAME_SUFFIX.len());

    let mut name: String = lowered.chars().take(keep).collect();
    name.push_str(TABLE_NAME_SUFFIX);
    name
}

/// Shortens a source field name that does not fit [`MAX_IDENTIFIER_LENGTH`], preserving case.
///
/// Names that fit are returned unchanged.
pub fn shorten_field_name(field_name: &str) -> String {
    if field_name.chars().count() <= MAX_IDENTIFIER_LENGTH {
        return field_name.to_string();
    }

    let mut name: String = field_name
        .replace(CUSTOM_FIELD_SUFFIX, "")
        .chars()
        .take(TRUNCATED_COLUMN_PREFIX_LENGTH)
        .collect();
    name.push_str(TRUNCATED_COLUMN_MARKER);
    name
}

/// Maps a payload field name to the lower-case column name used by the schema cache.
pub fn column_name_for_field(field_name: &str) -> String {
    shorten_field_name(field_name).to_lowercase()
}
