//! JSON export.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tablewright_model::Snapshot;

use super::ExportError;

pub fn write_json<W: io::Write>(snapshot: &Snapshot, mut writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn export_json(snapshot: &Snapshot, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_json(snapshot, BufWriter::new(file))
}
