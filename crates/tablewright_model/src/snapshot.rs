//! Read-only copies of a table handed to renderers and exporters.

use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::value::{format, ColumnType, Value};

/// Column header in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

/// Point-in-time copy of a table.
///
/// Serializes as
/// `{"name": .., "columns": [{"name": .., "type": ..}], "rows": [{col: value}]}`
/// with each row's keys in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub name: String,
    pub columns: Vec<SnapshotColumn>,
    pub rows: Vec<Vec<Value>>,
}

impl Snapshot {
    /// Column names, in order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Column headers annotated with their type, e.g. `id (integer)`.
    pub fn typed_headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.ty))
            .collect()
    }

    /// Every row rendered as text.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(format).collect())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Snapshot", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field(
            "rows",
            &RowsRef {
                columns: &self.columns,
                rows: &self.rows,
            },
        )?;
        state.end()
    }
}

struct RowsRef<'a> {
    columns: &'a [SnapshotColumn],
    rows: &'a [Vec<Value>],
}

impl Serialize for RowsRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows {
            seq.serialize_element(&RowRef {
                columns: self.columns,
                values: row,
            })?;
        }
        seq.end()
    }
}

struct RowRef<'a> {
    columns: &'a [SnapshotColumn],
    values: &'a [Value],
}

impl Serialize for RowRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(&column.name, value)?;
        }
        map.end()
    }
}
