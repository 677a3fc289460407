//! Typed table model for Tablewright.
//!
//! A [`Table`] holds ordered [`Column`]s and rows of [`Value`]s. Every cell
//! is validated against its column's [`ColumnType`] before it is admitted,
//! using the coercion rules in [`value`].
//!
//! # Usage
//!
//! ```rust
//! use tablewright_model::{ColumnType, Table, Value};
//!
//! let mut table = Table::new("people");
//! table.add_column("id", ColumnType::Integer)?;
//! table.add_column("name", ColumnType::Text)?;
//! table.add_row(&["1", "ada"])?;
//!
//! assert_eq!(table.cell(0, "id")?, &Value::Integer(1));
//! assert!(table.add_row(&["one", "grace"]).is_err());
//! # Ok::<(), tablewright_model::TableError>(())
//! ```

mod error;
mod snapshot;
mod table;
pub mod value;

pub use error::{Result, TableError};
pub use snapshot::{Snapshot, SnapshotColumn};
pub use table::{Column, Row, Table, TypeChange};
pub use value::{coerce, convert, format, ColumnType, Value};
