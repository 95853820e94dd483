//! Error types for parsing and querying fixed-width records.

use thiserror::Error;

use crate::lookup::LookupError;
use crate::parser::HookError;

/// The error type for every fallible operation in this crate.
///
/// Parse-time variants (`Io`, `Schema`, `Hook`) abort a whole file parse.
/// Query-time variants report caller mistakes instead of silently
/// excluding records.
#[derive(Debug, Error)]
pub enum FwfError {
    /// Reading the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The field map is malformed.
    #[error("Invalid field map: {0}")]
    Schema(String),

    /// A before/after hook failed with something other than a skip.
    #[error("Hook failed on line {line_number}: {source}")]
    Hook {
        line_number: usize,
        #[source]
        source: HookError,
    },

    /// A lookup, ordering or projection named a field the set was never
    /// given.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A projection asked for a field the record does not carry.
    #[error("Field '{field}' is missing on line {line_number}")]
    MissingField { field: String, line_number: usize },

    /// Projecting every field needs all records to share one header list.
    #[error("Record on line {line_number} has different fields than the first record")]
    HeaderMismatch { line_number: usize },

    /// A lookup could not be evaluated against a record's value.
    #[error("Lookup '{keyword}' failed: {source}")]
    Lookup {
        keyword: String,
        #[source]
        source: LookupError,
    },

    /// Two records hold values for the ordering field that cannot be compared.
    #[error("Cannot order by '{field}': {left} and {right} are not comparable")]
    Unorderable {
        field: String,
        left: &'static str,
        right: &'static str,
    },
}

/// A convenience `Result` type alias using [`FwfError`].
pub type Result<T> = std::result::Result<T, FwfError>;

impl FwfError {
    /// True for errors raised while reading or parsing a file, as opposed
    /// to errors raised by queries over an already parsed record set.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            FwfError::Io(_) | FwfError::Schema(_) | FwfError::Hook { .. }
        )
    }
}
