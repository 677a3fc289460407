use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tablewright_db::{Catalog, Store};
use tablewright_model::{ColumnType, Table};
use tempfile::TempDir;

fn tablewright_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tablewright"))
}

fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(tablewright_bin())
        .args(args)
        .env("TABLEWRIGHT_HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute tablewright CLI")
}

fn run_cli_json<T: for<'de> Deserialize<'de>>(home: &Path, args: &[&str]) -> T {
    let output = run_cli(home, args);
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}",
            err,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn run_cli_json_error(home: &Path, args: &[&str]) -> serde_json::Value {
    let output = run_cli(home, args);
    assert!(
        !output.status.success(),
        "command unexpectedly succeeded: {}\nstdout:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .unwrap_or_else(|| panic!("no JSON error on stderr:\n{}", stderr));
    serde_json::from_str(line).expect("invalid JSON error payload")
}

fn seed_shop(home: &Path) {
    let catalog = Catalog::new(home.join("db"));
    catalog.create_database("shop").unwrap();

    let mut store = Store::new();
    store.connect(&catalog, "shop").unwrap();
    let mut table = Table::new("items");
    table.add_column("name", ColumnType::Text).unwrap();
    table.add_column("price", ColumnType::Float).unwrap();
    table.add_column("stocked", ColumnType::Boolean).unwrap();
    table.add_row(&["pen", "1.5", "true"]).unwrap();
    table.add_row(&["ink", "", "false"]).unwrap();
    store.save(&mut table).unwrap();
}

#[derive(Debug, Deserialize)]
struct DatabaseEntry {
    name: String,
    size_bytes: u64,
    in_use: bool,
}

#[derive(Debug, Deserialize)]
struct TablesOutput {
    database: String,
    tables: Vec<String>,
}

#[test]
fn test_databases_json_empty_home() {
    let home = TempDir::new().unwrap();
    let entries: Vec<DatabaseEntry> = run_cli_json(home.path(), &["databases", "--json"]);
    assert!(entries.is_empty());
}

#[test]
fn test_databases_and_tables_json() {
    let home = TempDir::new().unwrap();
    seed_shop(home.path());

    let entries: Vec<DatabaseEntry> = run_cli_json(home.path(), &["databases", "--json"]);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "shop");
    assert!(entries[0].size_bytes > 0);
    assert!(!entries[0].in_use);

    let tables: TablesOutput = run_cli_json(home.path(), &["tables", "shop", "--json"]);
    assert_eq!(tables.database, "shop");
    assert_eq!(tables.tables, vec!["items".to_string()]);
}

#[test]
fn test_show_json_keeps_types_and_nulls() {
    let home = TempDir::new().unwrap();
    seed_shop(home.path());

    let shown: serde_json::Value = run_cli_json(home.path(), &["show", "shop", "items", "--json"]);
    assert_eq!(shown["name"], "items");
    assert_eq!(shown["columns"][1]["type"], "float");
    assert_eq!(shown["rows"][0]["price"], 1.5);
    assert_eq!(shown["rows"][0]["stocked"], true);
    assert!(shown["rows"][1]["price"].is_null());
}

#[test]
fn test_show_missing_table_reports_json_error() {
    let home = TempDir::new().unwrap();
    seed_shop(home.path());

    let err = run_cli_json_error(home.path(), &["show", "shop", "itemz", "--json"]);
    assert!(err["error"].as_str().unwrap().contains("'itemz'"));
    assert_eq!(err["context"], "Available tables: items");
}

#[test]
fn test_export_csv_writes_file() {
    let home = TempDir::new().unwrap();
    seed_shop(home.path());
    let output_path = home.path().join("out").join("items.csv");
    fs::create_dir_all(output_path.parent().unwrap()).unwrap();

    let output = run_cli(
        home.path(),
        &[
            "export",
            "shop",
            "items",
            "--format",
            "csv",
            "--output",
            output_path.to_str().unwrap(),
        ],
    );
    assert!(
        output.status.success(),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = fs::read_to_string(&output_path).unwrap();
    assert_eq!(written, "name,price,stocked\npen,1.5,true\nink,,false\n");
}

#[test]
fn test_export_missing_database_fails_with_suggestions() {
    let home = TempDir::new().unwrap();
    seed_shop(home.path());

    let output = run_cli(
        home.path(),
        &["export", "shopp", "items", "--format", "json"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: Database 'shopp' not found"), "{}", stderr);
    assert!(stderr.contains("Available databases: shop"), "{}", stderr);
}

#[test]
fn test_config_json_reports_home() {
    let home = TempDir::new().unwrap();

    let config: serde_json::Value = run_cli_json(home.path(), &["config", "--json"]);
    assert_eq!(config["home"], home.path().to_string_lossy().as_ref());
    assert_eq!(config["settings"]["values"]["autoprint_table"], false);
    assert_eq!(config["databases"]["count"], 0);
}
