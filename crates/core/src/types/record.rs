//! `~`-delimited record format.
//!
//! The backend returns cart lines and addresses as arrays of strings such as
//! `Wahl Senior~https://img/1.png~89.99~2`. Field order is fixed per record
//! kind and the field count must match exactly.

use thiserror::Error;

/// Field separator used in backend records.
pub const DELIMITER: char = '~';

/// Errors that can occur when parsing a delimited record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record does not have the expected number of fields.
    #[error("expected {expected} fields, found {found} in record {record:?}")]
    FieldCount {
        /// Number of fields the record kind requires.
        expected: usize,
        /// Number of fields actually present.
        found: usize,
        /// The offending raw record.
        record: String,
    },

    /// A required field is empty.
    #[error("field `{field}` is empty")]
    EmptyField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// A field could not be parsed into its typed value.
    #[error("field `{field}` is invalid: {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: &'static str,
        /// Why parsing failed.
        reason: String,
    },
}

/// Split a record into exactly `N` fields.
///
/// # Errors
///
/// Returns [`RecordError::FieldCount`] when the record has more or fewer
/// than `N` fields.
pub fn split<const N: usize>(record: &str) -> Result<[&str; N], RecordError> {
    let fields: Vec<&str> = record.split(DELIMITER).collect();
    let found = fields.len();

    fields.try_into().map_err(|_| RecordError::FieldCount {
        expected: N,
        found,
        record: record.to_string(),
    })
}

/// Require a field to be non-empty (after trimming whitespace).
///
/// # Errors
///
/// Returns [`RecordError::EmptyField`] if the field is blank.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::EmptyField { field });
    }
    Ok(value)
}

/// Join fields back into a record.
#[must_use]
pub fn join(fields: &[&str]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        out.push_str(field);
    }
    out
}
