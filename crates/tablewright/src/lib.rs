//! Tablewright: a terminal table builder.
//!
//! The table model lives in `tablewright_model` and persistence in
//! `tablewright_db`. This crate holds the interactive shell, the
//! non-interactive commands and the CSV/JSON/PDF exporters.

pub mod cli;
pub mod export;
