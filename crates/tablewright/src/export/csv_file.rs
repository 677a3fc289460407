//! CSV export and import.
//!
//! Export writes a header of column names and one record per row, each cell
//! rendered with [`format`](tablewright_model::format). Import reads every
//! column as text.

use std::fs::File;
use std::io;
use std::path::Path;

use tablewright_model::{Snapshot, Table};
use tracing::debug;

use super::ExportError;

pub fn write_csv<W: io::Write>(snapshot: &Snapshot, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(snapshot.headers())?;
    for row in snapshot.text_rows() {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv(snapshot: &Snapshot, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(snapshot, file)
}

/// Read CSV into an all-text table called `name`.
///
/// Short records are padded with empty text; records longer than the
/// header are an error.
pub fn read_csv<R: io::Read>(reader: R, name: &str) -> Result<Table, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();
    for record in rdr.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }
    debug!("Read {} CSV records for '{}'", records.len(), name);

    Ok(Table::from_text_grid(name, headers, records)?)
}

/// Import a CSV file; the table is named after the file stem.
pub fn import_csv(path: &Path) -> Result<Table, ExportError> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "imported".to_string());
    let file = File::open(path)?;
    read_csv(file, &name)
}
