//! SQLite persistence for Tablewright tables.
//!
//! - [`Catalog`]: a directory of `<name>.db` files
//! - [`Store`]: the current database connection; saves and loads whole tables
//! - [`backend`]: thin synchronous wrapper over `rusqlite` with tracing spans
//! - [`lock`]: single-holder file locks on database files

pub mod backend;
pub mod catalog;
mod error;
pub mod lock;
pub mod store;

pub use backend::{BackendError, DbConnection, DbRow, DbValue, FromDbValue};
pub use catalog::Catalog;
pub use error::{Result, StoreError};
pub use store::Store;
