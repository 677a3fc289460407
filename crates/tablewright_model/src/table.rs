//! The in-memory table being edited.
//!
//! Rows are stored positionally: cell `i` of every row belongs to column `i`.
//! Adding or removing a column therefore updates every row in the same call,
//! so the set of cells in a row always matches the column list.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TableError};
use crate::snapshot::{Snapshot, SnapshotColumn};
use crate::value::{coerce, convert, format, ColumnType, Value};

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One row of cells, aligned with the owning table's columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<Value>,
}

impl Row {
    /// Cells in column order.
    pub fn values(&self) -> &[Value] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Outcome of [`Table::change_column_type`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeChange {
    /// Number of non-null cells carried over to the new type.
    pub converted: usize,
    /// Rows whose cell had no representation in the new type and was unset.
    pub cleared: Vec<usize>,
}

/// A table: ordered typed columns plus ordered rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    saved: bool,
}

impl Table {
    /// Create an empty, unsaved table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            saved: false,
        }
    }

    /// Build a table from columns and already-typed rows.
    ///
    /// Every row is checked like [`Table::push_row`]. The result is unsaved.
    pub fn from_parts(
        name: impl Into<String>,
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let mut table = Self::new(name);
        for column in columns {
            table.add_column(column.name, column.ty)?;
        }
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build an all-text table from a header line and records, as read from CSV.
    ///
    /// Records shorter than the header are padded with empty text; longer
    /// records are rejected.
    pub fn from_text_grid(
        name: impl Into<String>,
        headers: Vec<String>,
        records: Vec<Vec<String>>,
    ) -> Result<Self> {
        let mut table = Self::new(name);
        for header in headers {
            table.add_column(header, ColumnType::Text)?;
        }
        let width = table.column_count();
        for mut record in records {
            if record.len() > width {
                return Err(TableError::ArityMismatch {
                    expected: width,
                    given: record.len(),
                });
            }
            record.resize(width, String::new());
            table.push_row(record.into_iter().map(Value::Text).collect())?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.saved = false;
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column other than `skip` whose name equals `name` up to
    /// ASCII case. SQLite treats such names as the same column.
    fn clashing_column(&self, name: &str, skip: Option<usize>) -> Option<usize> {
        self.columns
            .iter()
            .enumerate()
            .find(|(i, c)| Some(*i) != skip && c.name.eq_ignore_ascii_case(name))
            .map(|(i, _)| i)
    }

    /// Cell at `(row, column)`.
    pub fn cell(&self, row: usize, column: &str) -> Result<&Value> {
        let col = self.require_column(column)?;
        let row = self.require_row(row)?;
        Ok(&self.rows[row].cells[col])
    }

    /// True only immediately after a successful store save or load.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Record that the table now matches its persisted copy.
    pub fn mark_saved(&mut self) {
        self.saved = true;
    }

    /// Append a column, backfilling every existing row with [`Value::Null`].
    pub fn add_column(&mut self, name: impl Into<String>, ty: ColumnType) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TableError::EmptyColumnName);
        }
        if self.clashing_column(&name, None).is_some() {
            return Err(TableError::DuplicateColumn(name));
        }

        debug!(column = %name, ty = %ty, rows = self.rows.len(), "adding column");
        self.columns.push(Column::new(name, ty));
        for row in &mut self.rows {
            row.cells.push(Value::Null);
        }
        self.saved = false;
        Ok(())
    }

    pub fn rename_column(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let new = new.into();
        let index = self.require_column(old)?;
        if new.trim().is_empty() {
            return Err(TableError::EmptyColumnName);
        }
        if old == new {
            return Ok(());
        }
        if self.clashing_column(&new, Some(index)).is_some() {
            return Err(TableError::DuplicateColumn(new));
        }

        self.columns[index].name = new;
        self.saved = false;
        Ok(())
    }

    /// Change a column's declared type and re-validate its cells.
    ///
    /// Each non-null cell is converted with [`convert`]; cells with no
    /// representation in the new type become [`Value::Null`] and are listed
    /// in the returned report.
    pub fn change_column_type(&mut self, name: &str, ty: ColumnType) -> Result<TypeChange> {
        let index = self.require_column(name)?;
        let mut report = TypeChange::default();

        for (row_index, row) in self.rows.iter_mut().enumerate() {
            let cell = &mut row.cells[index];
            if cell.is_null() {
                continue;
            }
            match convert(cell, ty) {
                Some(value) if !value.is_null() => {
                    *cell = value;
                    report.converted += 1;
                }
                _ => {
                    *cell = Value::Null;
                    report.cleared.push(row_index);
                }
            }
        }

        debug!(
            column = %name,
            ty = %ty,
            converted = report.converted,
            cleared = report.cleared.len(),
            "changed column type"
        );
        self.columns[index].ty = ty;
        self.saved = false;
        Ok(report)
    }

    /// Remove a column and its cell from every row.
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let index = self.require_column(name)?;
        for row in &mut self.rows {
            row.cells.remove(index);
        }
        self.saved = false;
        Ok(self.columns.remove(index))
    }

    /// Append a row from literals, one per column in column order.
    ///
    /// All literals are coerced before anything is inserted; the first
    /// mismatch rejects the whole row.
    pub fn add_row<S: AsRef<str>>(&mut self, literals: &[S]) -> Result<()> {
        self.check_arity(literals.len())?;
        let cells = self
            .columns
            .iter()
            .zip(literals)
            .map(|(column, literal)| {
                coerce(literal.as_ref(), column.ty).map_err(|e| e.for_column(&column.name))
            })
            .collect::<Result<Vec<_>>>()?;

        self.rows.push(Row { cells });
        self.saved = false;
        Ok(())
    }

    /// Append a row of typed values. Each value must be null or match its
    /// column's type.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<()> {
        self.check_arity(values.len())?;
        for (column, value) in self.columns.iter().zip(&values) {
            if !value.conforms_to(column.ty) {
                return Err(TableError::type_mismatch(
                    column.name.clone(),
                    column.ty,
                    format(value),
                ));
            }
        }

        self.rows.push(Row { cells: values });
        self.saved = false;
        Ok(())
    }

    pub fn remove_row(&mut self, index: usize) -> Result<Row> {
        let index = self.require_row(index)?;
        self.saved = false;
        Ok(self.rows.remove(index))
    }

    /// Replace one cell. Nothing changes if any check fails.
    pub fn edit_cell(&mut self, row: usize, column: &str, literal: &str) -> Result<()> {
        let row = self.require_row(row)?;
        let col = self.require_column(column)?;
        let value = coerce(literal, self.columns[col].ty).map_err(|e| e.for_column(column))?;

        self.rows[row].cells[col] = value;
        self.saved = false;
        Ok(())
    }

    /// Drop every column and row, keeping the name.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.rows.clear();
        self.saved = false;
    }

    /// Read-only copy of the table for rendering and export.
    pub fn to_display_snapshot(&self) -> Snapshot {
        Snapshot {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| SnapshotColumn {
                    name: c.name.clone(),
                    ty: c.ty,
                })
                .collect(),
            rows: self.rows.iter().map(|r| r.cells.clone()).collect(),
        }
    }

    fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    fn require_row(&self, index: usize) -> Result<usize> {
        if index < self.rows.len() {
            Ok(index)
        } else {
            Err(TableError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }

    fn check_arity(&self, given: usize) -> Result<()> {
        if given == self.columns.len() {
            Ok(())
        } else {
            Err(TableError::ArityMismatch {
                expected: self.columns.len(),
                given,
            })
        }
    }
}
