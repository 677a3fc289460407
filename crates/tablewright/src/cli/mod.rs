//! CLI commands and the interactive shell

pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod output;
pub mod prompt;
pub mod session;
pub mod shell;
pub mod suggest;
