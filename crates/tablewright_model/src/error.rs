//! Error types for table model operations.

use thiserror::Error;

use crate::value::ColumnType;

/// Table model result type.
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors raised by table mutations and value coercion.
///
/// Every variant is recoverable: the table is left exactly as it was before
/// the failing call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// A column with this name, compared without ASCII case, already exists.
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    /// No column with this name exists.
    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    /// Row index outside `0..len`.
    #[error("Row {index} is out of range (table has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A literal could not be coerced to the column's declared type.
    #[error("Column '{column}' expects {expected}, got '{given}'")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        given: String,
    },

    /// A row was supplied with the wrong number of cells.
    #[error("Expected {expected} values, got {given}")]
    ArityMismatch { expected: usize, given: usize },

    /// Column names must contain at least one non-whitespace character.
    #[error("Column name must not be empty")]
    EmptyColumnName,
}

impl TableError {
    /// Create a type mismatch error.
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: ColumnType,
        given: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected,
            given: given.into(),
        }
    }

    /// Attach a column name to a mismatch produced by a bare coercion.
    pub(crate) fn for_column(self, column: &str) -> Self {
        match self {
            TableError::TypeMismatch {
                expected, given, ..
            } => TableError::TypeMismatch {
                column: column.to_string(),
                expected,
                given,
            },
            other => other,
        }
    }
}
