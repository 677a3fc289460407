//! Save/load behaviour of the store against real database files.

use tablewright_db::lock::{is_locked, lock_path_for};
use tablewright_db::{Catalog, Store, StoreError};
use tablewright_model::{ColumnType, Table, Value};
use tempfile::TempDir;

fn setup() -> (TempDir, Catalog, Store) {
    let temp = TempDir::new().unwrap();
    let catalog = Catalog::new(temp.path().join("db"));
    catalog.create_database("main").unwrap();
    let mut store = Store::new();
    store.connect(&catalog, "main").unwrap();
    (temp, catalog, store)
}

#[test]
fn test_save_load_round_trip() {
    let (_temp, _catalog, mut store) = setup();

    let mut table = Table::new("items");
    table.add_column("id", ColumnType::Integer).unwrap();
    table.add_column("label", ColumnType::Text).unwrap();
    table.add_row(&["1", "a"]).unwrap();
    table.add_row(&["2", "b"]).unwrap();
    assert!(!table.is_saved());

    store.save(&mut table).unwrap();
    assert!(table.is_saved());

    let loaded = store.load("items").unwrap();
    assert!(loaded.is_saved());
    assert_eq!(loaded.name(), "items");
    assert_eq!(loaded.columns(), table.columns());
    assert_eq!(loaded.cell(0, "id").unwrap(), &Value::Integer(1));
    assert_eq!(loaded.cell(0, "label").unwrap(), &Value::from("a"));
    assert_eq!(loaded.cell(1, "id").unwrap(), &Value::Integer(2));
    assert_eq!(loaded.cell(1, "label").unwrap(), &Value::from("b"));
}

#[test]
fn test_save_replaces_previous_rows() {
    let (_temp, _catalog, mut store) = setup();

    let mut table = Table::new("log");
    table.add_column("n", ColumnType::Integer).unwrap();
    for n in ["1", "2", "3"] {
        table.add_row(&[n]).unwrap();
    }
    store.save(&mut table).unwrap();

    table.remove_row(0).unwrap();
    assert!(!table.is_saved());
    store.save(&mut table).unwrap();

    let loaded = store.load("log").unwrap();
    assert_eq!(loaded.row_count(), 2);
    assert_eq!(loaded.cell(0, "n").unwrap(), &Value::Integer(2));
}

#[test]
fn test_boolean_and_null_survive_round_trip() {
    let (_temp, _catalog, mut store) = setup();

    let mut table = Table::new("flags");
    table.add_column("on", ColumnType::Boolean).unwrap();
    table.add_column("score", ColumnType::Float).unwrap();
    table.add_row(&["false", ""]).unwrap();
    table.add_row(&["TRUE", "0.1"]).unwrap();
    store.save(&mut table).unwrap();

    let loaded = store.load("flags").unwrap();
    assert_eq!(loaded.column("on").unwrap().ty, ColumnType::Boolean);
    assert_eq!(loaded.cell(0, "on").unwrap(), &Value::Boolean(false));
    assert_eq!(loaded.cell(0, "score").unwrap(), &Value::Null);
    assert_eq!(loaded.cell(1, "score").unwrap(), &Value::Float(0.1));
}

#[test]
fn test_delete_missing_relation_leaves_store_unchanged() {
    let (_temp, _catalog, mut store) = setup();

    let mut table = Table::new("keep");
    table.add_column("x", ColumnType::Text).unwrap();
    table.add_row(&["v"]).unwrap();
    store.save(&mut table).unwrap();

    let err = store.delete_relation("nope").unwrap_err();

    assert!(matches!(err, StoreError::RelationNotFound(ref n) if n == "nope"));
    assert_eq!(store.list_relations().unwrap(), vec!["keep"]);
    assert_eq!(store.load("keep").unwrap().row_count(), 1);
}

#[test]
fn test_data_persists_across_connections() {
    let (_temp, catalog, mut store) = setup();

    let mut table = Table::new("people");
    table.add_column("name", ColumnType::Text).unwrap();
    table.add_row(&["ada"]).unwrap();
    store.save(&mut table).unwrap();
    store.close().unwrap();
    assert_eq!(store.current_database(), None);

    let mut reopened = Store::new();
    reopened.connect(&catalog, "main").unwrap();
    let loaded = reopened.load("people").unwrap();
    assert_eq!(loaded.cell(0, "name").unwrap(), &Value::from("ada"));
}

#[test]
fn test_lock_released_on_close_and_drop() {
    let (_temp, catalog, mut store) = setup();
    let path = catalog.path_for("main");

    assert!(is_locked(&path));
    let mut second = Store::new();
    let err = second.connect(&catalog, "main").unwrap_err();
    assert!(matches!(err, StoreError::Locked(ref n) if n == "main"));

    store.close().unwrap();
    assert!(!is_locked(&path));

    second.connect(&catalog, "main").unwrap();
    assert!(is_locked(&path));
    drop(second);
    assert!(!is_locked(&path));
    assert!(lock_path_for(&path).exists());
}
