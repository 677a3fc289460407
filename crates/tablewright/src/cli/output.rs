//! Terminal rendering: comfy-table grids for snapshots and listings, plus
//! size and time formatting for the `databases` command.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use std::time::SystemTime;
use tablewright_model::{ColumnType, Snapshot, Value};

/// Binary units, one decimal: `1536` is `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a system time as a local timestamp
pub fn format_time(time: SystemTime) -> String {
    use chrono::{DateTime, Local};

    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d %H:%M").to_string()
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cells<I, S>(headers: I) -> Vec<Cell>
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    headers
        .into_iter()
        .map(|h| Cell::new(h.to_string()).fg(Color::Cyan))
        .collect()
}

/// Build a table with headers and rows
pub fn build_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut table = base_table();
    table.set_header(header_cells(headers.iter()));
    for row in rows {
        table.add_row(row);
    }
    table
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    println!("{}", build_table(headers, rows));
}

/// Render a snapshot: typed headers, unset cells dimmed, numbers right-aligned.
pub fn render_snapshot(snapshot: &Snapshot) -> Table {
    let mut table = base_table();
    table.set_header(header_cells(snapshot.typed_headers()));

    for row in &snapshot.rows {
        let cells: Vec<Cell> = row
            .iter()
            .zip(&snapshot.columns)
            .map(|(value, column)| value_cell(value, column.ty))
            .collect();
        table.add_row(cells);
    }

    for (index, column) in snapshot.columns.iter().enumerate() {
        if matches!(column.ty, ColumnType::Integer | ColumnType::Float) {
            if let Some(col) = table.column_mut(index) {
                col.set_cell_alignment(comfy_table::CellAlignment::Right);
            }
        }
    }
    table
}

fn value_cell(value: &Value, ty: ColumnType) -> Cell {
    match value {
        Value::Null => Cell::new("").fg(Color::DarkGrey),
        Value::Boolean(true) => Cell::new("true").fg(Color::Green),
        Value::Boolean(false) => Cell::new("false").fg(Color::Red),
        other => {
            let cell = Cell::new(tablewright_model::format(other));
            if ty == ColumnType::Text {
                cell
            } else {
                cell.fg(Color::Magenta)
            }
        }
    }
}

/// Title line printed above a rendered snapshot.
pub fn snapshot_caption(snapshot: &Snapshot) -> String {
    let rows = snapshot.rows.len();
    format!(
        "{} ({} column{}, {} row{})",
        if snapshot.name.is_empty() {
            "untitled"
        } else {
            snapshot.name.as_str()
        },
        snapshot.columns.len(),
        if snapshot.columns.len() == 1 { "" } else { "s" },
        rows,
        if rows == 1 { "" } else { "s" }
    )
}

/// Numbered list, as used for database and table pickers.
pub fn numbered_list(title: &str, items: &[String]) -> Table {
    let rows = items
        .iter()
        .enumerate()
        .map(|(i, item)| vec![(i + 1).to_string(), item.clone()])
        .collect();
    build_table(&["#", title], rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablewright_model::Table as ModelTable;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1048576), "1.0 MB");
        assert_eq!(format_size(1073741824), "1.0 GB");
    }

    #[test]
    fn test_render_snapshot_contains_cells() {
        let mut model = ModelTable::new("people");
        model.add_column("name", ColumnType::Text).unwrap();
        model.add_column("age", ColumnType::Integer).unwrap();
        model.add_row(&["ada", "36"]).unwrap();
        model.add_row(&["alan", ""]).unwrap();

        let snapshot = model.to_display_snapshot();
        let mut table = render_snapshot(&snapshot);
        table.force_no_tty();
        let rendered = table.to_string();

        assert!(rendered.contains("name (text)"));
        assert!(rendered.contains("age (integer)"));
        assert!(rendered.contains("ada"));
        assert!(rendered.contains("36"));
        assert_eq!(snapshot_caption(&snapshot), "people (2 columns, 2 rows)");
    }

    #[test]
    fn test_numbered_list() {
        let mut table = numbered_list("Database", &["main".to_string(), "shop".to_string()]);
        table.force_no_tty();
        let rendered = table.to_string();
        assert!(rendered.contains("1"));
        assert!(rendered.contains("shop"));
    }
}
