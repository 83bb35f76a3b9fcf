use crate::schema::ColumnRow;

pub const PARTY_OBJECT_TYPE: &str = "Party__c";
pub const PARTY_TABLE: &str = "party__c";

pub const OFFERING_OBJECT_TYPE: &str = "Offering__c";
pub const OFFERING_TABLE: &str = "offering__c";

/// Columns of the party table, including a reserved column the cache must skip.
pub fn party_columns() -> Vec<ColumnRow> {
    vec![
        ColumnRow::new("PARTY__C", "ID", "CHARACTER VARYING"),
        ColumnRow::new("PARTY__C", "NAME", "CHARACTER VARYING"),
        ColumnRow::new("PARTY__C", "ACTIVE__C", "NUMERIC"),
        ColumnRow::new("PARTY__C", "CREATEDDATE", "TIMESTAMP(6)"),
        ColumnRow::new("PARTY__C", "NOTES__C", "TEXT"),
        ColumnRow::new("PARTY__C", "_SYNC_TS", "TIMESTAMP(6)"),
    ]
}

pub fn offering_columns() -> Vec<ColumnRow> {
    vec![
        ColumnRow::new("OFFERING__C", "ID", "CHARACTER VARYING"),
        ColumnRow::new("OFFERING__C", "NAME", "CHARACTER VARYING"),
        ColumnRow::new("OFFERING__C", "START_DATE__C", "DATE"),
    ]
}

/// Columns of every fixture table.
pub fn all_columns() -> Vec<ColumnRow> {
    let mut columns = party_columns();
    columns.extend(offering_columns());
    columns
}
