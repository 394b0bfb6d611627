// src/error.rs

//! Typed errors for the table engine.
//!
//! Library code returns [`Result`]; binaries wrap these in `anyhow`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// The value legitimately doesn't exist for this document variant
    /// (e.g. a header lookup on a table without a header).
    #[error("expected absence: {0}")]
    ExpectedAbsence(String),

    /// An extractor produced a different number of values than there are rows.
    #[error("field `{field}` yielded {got} values for {expected} rows")]
    StructuralMismatch {
        field: String,
        expected: usize,
        got: usize,
    },

    #[error("column `{0}` isn't in table header")]
    ColumnNotFound(String),

    #[error("column index {index} is out of range for rows of {row_length} columns")]
    InvalidColumnIndex { index: isize, row_length: usize },

    #[error("cannot add {got} values to a table of {expected} rows")]
    LengthMismatch { expected: usize, got: usize },

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("unsupported table container `<{0}>`")]
    UnsupportedContainer(String),

    #[error("invalid time `{0}`")]
    InvalidTime(String),

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("field `{0}` isn't available for this table")]
    FieldUnavailable(String),

    #[error("field `{0}` is missing from table rows")]
    MissingField(String),

    #[error("join key `{0}` is missing from a row")]
    MissingJoinKey(String),
}

impl TableError {
    /// True for errors callers are expected to swallow and replace with a default.
    pub fn is_expected_absence(&self) -> bool {
        matches!(self, TableError::ExpectedAbsence(_))
    }

    pub fn is_column_not_found(&self) -> bool {
        matches!(self, TableError::ColumnNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
