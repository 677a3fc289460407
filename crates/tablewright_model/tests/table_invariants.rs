use tablewright_model::{coerce, format, ColumnType, Table, TableError, Value};

fn keys_match_columns(table: &Table) -> bool {
    table
        .rows()
        .iter()
        .all(|row| row.len() == table.column_count())
}

#[test]
fn test_literals_round_trip_through_format() {
    let cases = [
        ("0", ColumnType::Integer),
        ("-42", ColumnType::Integer),
        ("3.25", ColumnType::Float),
        ("1e-3", ColumnType::Float),
        ("TRUE", ColumnType::Boolean),
        ("false", ColumnType::Boolean),
        ("hello, world", ColumnType::Text),
    ];
    for (literal, ty) in cases {
        let value = coerce(literal, ty).unwrap();
        let again = coerce(&format(&value), ty).unwrap();
        assert_eq!(value, again, "{literal} as {ty}");
    }
}

#[test]
fn test_column_added_after_rows_is_backfilled() {
    let mut table = Table::new("t");
    table.add_column("a", ColumnType::Integer).unwrap();
    for i in 0..5 {
        table.add_row(&[i.to_string()]).unwrap();
    }

    table.add_column("b", ColumnType::Text).unwrap();

    assert!(keys_match_columns(&table));
    for row in 0..table.row_count() {
        assert_eq!(table.cell(row, "b").unwrap(), &Value::Null);
    }

    table.add_row(&["9", ""]).unwrap();
    assert_eq!(table.cell(5, "b").unwrap(), &Value::from(""));
    assert_ne!(table.cell(5, "b").unwrap(), table.cell(0, "b").unwrap());
}

#[test]
fn test_column_removal_keeps_rows_aligned() {
    let mut table = Table::new("t");
    table.add_column("a", ColumnType::Integer).unwrap();
    table.add_column("b", ColumnType::Boolean).unwrap();
    table.add_column("c", ColumnType::Float).unwrap();
    table.add_row(&["1", "true", "0.5"]).unwrap();
    table.add_row(&["2", "false", "1.5"]).unwrap();
    assert!(keys_match_columns(&table));

    table.remove_column("b").unwrap();

    assert!(keys_match_columns(&table));
    assert!(table.column("b").is_none());
    assert_eq!(table.cell(1, "c").unwrap(), &Value::Float(1.5));
}

#[test]
fn test_rejected_row_is_not_partially_inserted() {
    let mut table = Table::new("t");
    table.add_column("name", ColumnType::Text).unwrap();
    table.add_column("age", ColumnType::Integer).unwrap();

    let err = table.add_row(&["bob", "abc"]).unwrap_err();

    assert!(matches!(
        err,
        TableError::TypeMismatch { ref column, expected: ColumnType::Integer, ref given }
            if column == "age" && given == "abc"
    ));
    assert_eq!(table.row_count(), 0);
}
