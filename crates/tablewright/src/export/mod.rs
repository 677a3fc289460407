//! Export adapters.
//!
//! Exporters read a [`Snapshot`] and write it somewhere; none of them touch
//! the table or its saved flag. CSV is the only format that can be read back.

pub mod csv_file;
pub mod json;
pub mod pdf;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tablewright_model::{Snapshot, TableError};
use thiserror::Error;
use tracing::info;

/// Errors from import and export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("CSV does not form a valid table: {0}")]
    Model(#[from] TableError),
}

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `<table name>.<ext>` in the current directory.
pub fn default_output_path(table_name: &str, format: ExportFormat) -> PathBuf {
    let stem: String = table_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "table".to_string() } else { stem };
    PathBuf::from(format!("{}.{}", stem, format.extension()))
}

/// Write `snapshot` to `path` in `format`, replacing any existing file.
pub fn export_snapshot(
    snapshot: &Snapshot,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => csv_file::export_csv(snapshot, path)?,
        ExportFormat::Json => json::export_json(snapshot, path)?,
        ExportFormat::Pdf => pdf::export_pdf(snapshot, path)?,
    }
    info!(
        "Exported '{}' as {} to {}",
        snapshot.name,
        format,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path("sales", ExportFormat::Csv),
            PathBuf::from("sales.csv")
        );
        assert_eq!(
            default_output_path("q1 / q2", ExportFormat::Pdf),
            PathBuf::from("q1___q2.pdf")
        );
        assert_eq!(
            default_output_path("", ExportFormat::Json),
            PathBuf::from("table.json")
        );
    }
}
