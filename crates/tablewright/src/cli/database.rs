//! Non-interactive commands over stored databases: list, show, export.

use std::path::PathBuf;

use serde::Serialize;
use tablewright_db::{lock, Catalog, Store, StoreError};
use tablewright_model::Table;

use super::error::HelpfulError;
use super::output::{format_size, format_time, print_table, render_snapshot, snapshot_caption};
use crate::export::{default_output_path, export_snapshot, ExportFormat};

/// Arguments for the databases command
#[derive(Debug, clap::Args)]
pub struct DatabasesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the tables command
#[derive(Debug, clap::Args)]
pub struct TablesArgs {
    /// Database name
    pub database: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the show command
#[derive(Debug, clap::Args)]
pub struct ShowArgs {
    /// Database name
    pub database: String,

    /// Table name
    pub table: String,

    /// Output the table data as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the export command
#[derive(Debug, clap::Args)]
pub struct ExportArgs {
    /// Database name
    pub database: String,

    /// Table name
    pub table: String,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: ExportFormat,

    /// Output file (default: <table>.<format> in the current directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DatabaseInfo {
    name: String,
    path: String,
    size_bytes: u64,
    modified: Option<String>,
    in_use: bool,
    /// Process id recorded by the session holding the database.
    held_by: Option<u32>,
}

fn database_info(catalog: &Catalog, name: &str) -> DatabaseInfo {
    let path = catalog.path_for(name);
    let metadata = std::fs::metadata(&path).ok();
    let in_use = lock::is_locked(&path);
    DatabaseInfo {
        name: name.to_string(),
        path: path.display().to_string(),
        size_bytes: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
        modified: metadata
            .and_then(|m| m.modified().ok())
            .map(format_time),
        in_use,
        held_by: if in_use {
            lock::lock_holder(&path).map(|holder| holder.pid)
        } else {
            None
        },
    }
}

/// Connect to `database`, listing the alternatives when it does not exist.
fn open_store(catalog: &Catalog, database: &str) -> Result<Store, HelpfulError> {
    let mut store = Store::new();
    match store.connect(catalog, database) {
        Ok(()) => Ok(store),
        Err(StoreError::DatabaseNotFound(_)) => {
            let available = catalog.list_databases().unwrap_or_default();
            Err(HelpfulError::database_not_found(database, &available))
        }
        Err(err) => Err(HelpfulError::from_store(&err)),
    }
}

fn load_table(store: &Store, database: &str, name: &str) -> Result<Table, HelpfulError> {
    match store.load(name) {
        Ok(table) => Ok(table),
        Err(StoreError::RelationNotFound(_)) => {
            let available = store.list_relations().unwrap_or_default();
            Err(HelpfulError::table_not_found(database, name, &available))
        }
        Err(err) => Err(HelpfulError::from_store(&err)),
    }
}

/// List the databases in the catalog.
pub fn run_databases(catalog: &Catalog, args: DatabasesArgs) -> anyhow::Result<()> {
    let names = catalog
        .list_databases()
        .map_err(|e| HelpfulError::from_store(&e))?;
    let infos: Vec<DatabaseInfo> = names.iter().map(|n| database_info(catalog, n)).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    if infos.is_empty() {
        println!("No databases in {}", catalog.dir().display());
        println!();
        println!("Create one in the shell: tablewright -> database -> create database");
        return Ok(());
    }

    let rows = infos
        .into_iter()
        .map(|info| {
            vec![
                info.name,
                format_size(info.size_bytes),
                info.modified.unwrap_or_else(|| "-".to_string()),
                match (info.in_use, info.held_by) {
                    (true, Some(pid)) => format!("in use (pid {})", pid),
                    (true, None) => "in use".to_string(),
                    (false, _) => String::new(),
                },
            ]
        })
        .collect();
    print_table(&["NAME", "SIZE", "MODIFIED", "STATUS"], rows);
    Ok(())
}

/// List the tables stored in one database.
pub fn run_tables(catalog: &Catalog, args: TablesArgs) -> anyhow::Result<()> {
    let store = open_store(catalog, &args.database)?;
    let relations = store
        .list_relations()
        .map_err(|e| HelpfulError::from_store(&e))?;

    if args.json {
        let payload = serde_json::json!({
            "database": args.database,
            "tables": relations,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if relations.is_empty() {
        println!("No tables in database '{}'", args.database);
        return Ok(());
    }
    for name in relations {
        println!("{}", name);
    }
    Ok(())
}

/// Print a stored table.
pub fn run_show(catalog: &Catalog, args: ShowArgs) -> anyhow::Result<()> {
    let store = open_store(catalog, &args.database)?;
    let table = load_table(&store, &args.database, &args.table)?;
    let snapshot = table.to_display_snapshot();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", snapshot_caption(&snapshot));
        println!("{}", render_snapshot(&snapshot));
    }
    Ok(())
}

/// Export a stored table to a file.
pub fn run_export(catalog: &Catalog, args: ExportArgs) -> anyhow::Result<()> {
    let store = open_store(catalog, &args.database)?;
    let table = load_table(&store, &args.database, &args.table)?;
    let snapshot = table.to_display_snapshot();

    let path = args
        .output
        .unwrap_or_else(|| default_output_path(&snapshot.name, args.format));
    export_snapshot(&snapshot, args.format, &path)
        .map_err(|e| HelpfulError::from_export(&e, &path))?;

    println!(
        "Exported '{}' ({} rows) to {}",
        snapshot.name,
        snapshot.rows.len(),
        path.display()
    );
    Ok(())
}
