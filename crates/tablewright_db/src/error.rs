//! Error types for the store layer.

use thiserror::Error;

use crate::backend::BackendError;
use tablewright_model::TableError;

/// Store operation result type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An operation that needs an open database was called without one.
    #[error("No database is connected")]
    NotConnected,

    /// The named relation does not exist in the connected database.
    #[error("Table '{0}' not found in database")]
    RelationNotFound(String),

    /// No database file with this name exists in the catalog.
    #[error("Database '{0}' not found")]
    DatabaseNotFound(String),

    /// A database file with this name already exists.
    #[error("Database '{0}' already exists")]
    DatabaseExists(String),

    /// Database or relation name is not usable.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The relation exists under a spelling that differs only in case.
    #[error("Table '{name}' clashes with existing table '{existing}' (table names ignore case)")]
    NameClash { name: String, existing: String },

    /// A table without columns cannot be stored.
    #[error("Table '{0}' has no columns to save")]
    EmptySchema(String),

    /// Another process holds the database lock.
    #[error("Database '{0}' is in use by another process")]
    Locked(String),

    /// A stored value has no representation in the column's type.
    #[error("Cannot read row {row} of column '{column}' in '{relation}': {detail}")]
    TypeConversion {
        relation: String,
        column: String,
        row: usize,
        detail: String,
    },

    /// Stored data violates a table model invariant.
    #[error("Stored table is inconsistent: {0}")]
    Model(#[from] TableError),

    /// Driver-level failure (disk full, locked file, constraint, ...).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(BackendError::from(err))
    }
}
