//! User-facing errors for the shell and the one-shot commands.
//!
//! A [`HelpfulError`] prints as an `ERROR:` line, an optional `CONTEXT:` line
//! and indented `TRY:` hints.

use std::fmt;
use std::path::Path;

use tablewright_db::StoreError;
use tablewright_model::TableError;

use crate::export::ExportError;

#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    /// What was being attempted, or what exists instead.
    pub context: Option<String>,
    /// `TRY:` lines, in display order.
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    pub fn not_connected() -> Self {
        Self::new("No database is set")
            .with_context("Saving, loading and listing tables need a current database")
            .with_suggestions([
                "TRY: Open the database menu and run 'set database'",
                "TRY: Create one first with 'create database'",
            ])
    }

    pub fn database_not_found(name: &str, available: &[String]) -> Self {
        let err = Self::new(format!("Database '{}' not found", name));
        if available.is_empty() {
            err.with_context("No databases exist yet")
                .with_suggestion("TRY: Create one in the shell: database -> create database")
        } else {
            err.with_context(format!("Available databases: {}", available.join(", ")))
                .with_suggestion("TRY: List databases: tablewright databases")
        }
    }

    pub fn table_not_found(database: &str, name: &str, available: &[String]) -> Self {
        let err = Self::new(format!("Table '{}' not found in database '{}'", name, database));
        if available.is_empty() {
            err.with_context(format!("Database '{}' has no tables", database))
        } else {
            err.with_context(format!("Available tables: {}", available.join(", ")))
                .with_suggestion(format!("TRY: List tables: tablewright tables {}", database))
        }
    }

    pub fn database_locked(name: &str) -> Self {
        Self::new(format!("Database '{}' is in use", name))
            .with_context("Another tablewright session has this database open")
            .with_suggestions([
                "TRY: Close the database in the other session ('close database')".to_string(),
                format!("TRY: Check the lock owner in {}.db.lock.json", name),
            ])
    }

    pub fn cannot_write_file(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot write file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Check that the directory exists and is writable".to_string(),
                format!(
                    "TRY: Pick another location: ls -la {}",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .filter(|p| !p.is_empty())
                        .unwrap_or_else(|| ".".to_string())
                ),
            ])
    }

    pub fn cannot_read_file(path: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot read file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check file permissions: ls -la {}", path.display()),
                "TRY: Check for typos in the path".to_string(),
            ])
    }

    pub fn csv_parse_error(path: &Path, details: &str) -> Self {
        Self::new(format!("CSV error: {}", details))
            .with_context(format!("Failed to import CSV file: {}", path.display()))
            .with_suggestions([
                "TRY: The first line must hold unique, non-empty column names".to_string(),
                format!("TRY: Inspect the raw file: head -n 5 {}", path.display()),
            ])
    }

    /// Map a store error to a message with suggestions.
    pub fn from_store(err: &StoreError) -> Self {
        match err {
            StoreError::NotConnected => Self::not_connected(),
            StoreError::DatabaseNotFound(name) => Self::database_not_found(name, &[]),
            StoreError::Locked(name) => Self::database_locked(name),
            StoreError::DatabaseExists(name) => {
                Self::new(format!("Database '{}' already exists", name))
                    .with_suggestion("TRY: Pick another name or 'set database' to use it")
            }
            StoreError::InvalidName { name, reason } => {
                Self::new(format!("Invalid name '{}'", name)).with_context(reason.clone())
            }
            StoreError::EmptySchema(name) => Self::new(format!("Table '{}' has no columns", name))
                .with_suggestion("TRY: Add a column with 'add column' before saving"),
            StoreError::NameClash { name, existing } => Self::new(format!(
                "Table '{}' would overwrite table '{}'",
                name, existing
            ))
            .with_context("Table names in a database ignore upper and lower case")
            .with_suggestions([
                format!("TRY: 'rename' the table to '{}' to replace it", existing),
                "TRY: 'rename' the table to a different name to keep both".to_string(),
            ]),
            StoreError::Model(inner) => Self::from_table(inner),
            other => Self::new(other.to_string()),
        }
    }

    /// Map a table model error to a message with suggestions.
    pub fn from_table(err: &TableError) -> Self {
        match err {
            TableError::TypeMismatch { expected, .. } => {
                Self::new(err.to_string()).with_suggestion(format!(
                    "TRY: Enter a valid {} or leave the value empty to unset it",
                    expected
                ))
            }
            TableError::DuplicateColumn(_) => Self::new(err.to_string())
                .with_suggestion("TRY: Column names must differ by more than upper and lower case"),
            TableError::UnknownColumn(_) => Self::new(err.to_string())
                .with_suggestion("TRY: 'print table' shows the column names"),
            TableError::IndexOutOfRange { len, .. } => Self::new(err.to_string())
                .with_suggestion(format!("TRY: Row numbers run from 1 to {}", len)),
            _ => Self::new(err.to_string()),
        }
    }

    pub fn from_export(err: &ExportError, path: &Path) -> Self {
        match err {
            ExportError::Io(io) => Self::cannot_write_file(path, &io.to_string()),
            other => Self::new(other.to_string())
                .with_context(format!("While writing {}", path.display())),
        }
    }

    /// Message and suggestions on one line each, without the headings.
    pub fn short_lines(&self) -> Vec<String> {
        let mut lines = vec![self.message.clone()];
        lines.extend(self.context.clone());
        lines.extend(self.suggestions.iter().cloned());
        lines
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(context) = &self.context {
            writeln!(f, "CONTEXT: {}", context)?;
        }
        if self.suggestions.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        self.suggestions
            .iter()
            .try_for_each(|hint| writeln!(f, "  {}", hint))
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stderr for `--json` callers.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": helpful.message,
            "context": helpful.context,
            "suggestions": helpful.suggestions,
        }),
        None => serde_json::json!({
            "error": format!("{:#}", err),
        }),
    };
    eprintln!("{}", payload);
}
