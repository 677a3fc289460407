//! Interactive menu shell.
//!
//! [`Shell`] runs the main menu and its three sub-menus over a [`Session`].
//! All input comes from a [`Prompt`] and all output goes to a
//! [`MessageSink`], so a whole session can be scripted in tests.
//!
//! Command failures are reported through the sink and the menu keeps
//! running; only the end of input or `exit` leaves a menu.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use tablewright_db::StoreError;
use tablewright_model::{coerce, ColumnType, Table, TableError, TypeChange};
use tracing::{debug, info, warn};

use super::commands::{normalize, Menu};
use super::config::{on_off, parse_on_off};
use super::error::HelpfulError;
use super::output::build_table;
use super::prompt::{MessageSink, Prompt};
use super::session::Session;
use super::suggest::suggest;
use crate::export::{csv_file, default_output_path, export_snapshot, ExportError, ExportFormat};

const WELCOME: &str = "Welcome to Tablewright!\n\
Build tables, save them to a database and export them.\n\
Type 'help' to list the commands of the current menu.";

/// What a menu does after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Stay,
    Leave,
}

fn no_table() -> anyhow::Error {
    HelpfulError::new("No table is open")
        .with_suggestions([
            "TRY: Start one with 'new table'",
            "TRY: Open a saved one with 'load table' or 'load csv'",
        ])
        .into()
}

/// Turn a 1-based row number typed by the user into an index below `len`.
fn row_index(input: &str, len: usize) -> Result<usize> {
    let input = input.trim();
    match input.parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Ok(n - 1),
        _ if len == 0 => Err(HelpfulError::new("The table has no rows")
            .with_suggestion("TRY: Add one with 'add row'")
            .into()),
        _ => Err(HelpfulError::new(format!("Invalid row number '{}'", input))
            .with_suggestion(format!("TRY: Row numbers run from 1 to {}", len))
            .into()),
    }
}

fn describe_type_change(column: &str, ty: ColumnType, change: &TypeChange) -> String {
    let mut message = format!(
        "Column '{}' is now {} ({} cell(s) converted).",
        column, ty, change.converted
    );
    if !change.cleared.is_empty() {
        let rows: Vec<String> = change.cleared.iter().map(|r| (r + 1).to_string()).collect();
        message.push_str(&format!(
            "\nCells that could not be converted were unset in row(s) {}.",
            rows.join(", ")
        ));
    }
    message
}

/// The interactive controller.
pub struct Shell<P, S> {
    session: Session,
    prompt: P,
    sink: S,
    input_closed: bool,
}

impl<P: Prompt, S: MessageSink> Shell<P, S> {
    pub fn new(session: Session, prompt: P, sink: S) -> Self {
        Self {
            session,
            prompt,
            sink,
            input_closed: false,
        }
    }

    pub fn into_parts(self) -> (Session, P, S) {
        (self.session, self.prompt, self.sink)
    }

    /// Run the main menu until `exit` or the end of input, then close the
    /// current database.
    pub fn run(&mut self) {
        info!("Interactive session started");
        self.sink.report_info(WELCOME);
        self.run_menu(Menu::Main);

        if self.input_closed && self.session.has_unsaved_changes() {
            warn!(
                table = %self.current_table_name(),
                "Input ended with unsaved changes"
            );
        }
        self.session.close();
        info!("Interactive session ended");
    }

    fn run_menu(&mut self, menu: Menu) {
        if menu == Menu::TableBuilder && self.session.table.is_none() {
            if let Err(e) = self.new_table() {
                self.report(&e);
            }
            if self.session.table.is_none() {
                return;
            }
        }

        while !self.input_closed {
            let Some(input) = self.ask(&format!("{} > ", menu.title())) else {
                break;
            };
            if input.trim().is_empty() {
                continue;
            }
            let Some(command) = menu.lookup(&input) else {
                self.unknown_command(menu, &input);
                continue;
            };

            debug!(menu = menu.title(), command, "Running command");
            match self.dispatch(menu, command) {
                Ok(Flow::Stay) => {}
                Ok(Flow::Leave) => break,
                Err(e) => self.report(&e),
            }
        }
    }

    fn dispatch(&mut self, menu: Menu, command: &str) -> Result<Flow> {
        match (menu, command) {
            (_, "help") => {
                self.sink.show_help(menu.title(), menu.commands());
                Ok(Flow::Stay)
            }
            (Menu::Main, "exit") => Ok(if self.confirm_exit() {
                Flow::Leave
            } else {
                Flow::Stay
            }),
            (_, "exit") => Ok(Flow::Leave),
            (Menu::Main, "table builder") => {
                self.run_menu(Menu::TableBuilder);
                Ok(Flow::Stay)
            }
            (Menu::Main, "database") => {
                self.run_menu(Menu::Database);
                Ok(Flow::Stay)
            }
            (Menu::Main, "settings") => {
                self.run_menu(Menu::Settings);
                Ok(Flow::Stay)
            }
            (Menu::TableBuilder, command) => self.table_command(command).map(|()| Flow::Stay),
            (Menu::Database, command) => self.database_command(command).map(|()| Flow::Stay),
            (Menu::Settings, command) => self.settings_command(command).map(|()| Flow::Stay),
            (Menu::Main, command) => Err(anyhow!("Unhandled command '{}'", command)),
        }
    }

    // === Input helpers ===

    fn ask(&mut self, prompt: &str) -> Option<String> {
        let answer = self.prompt.ask(prompt);
        if answer.is_none() {
            self.input_closed = true;
        }
        answer
    }

    fn ask_trimmed(&mut self, prompt: &str) -> Option<String> {
        self.ask(prompt).map(|answer| answer.trim().to_string())
    }

    fn confirm(&mut self, question: &str) -> bool {
        let answer = self
            .ask_trimmed(&format!("{} (yes/no): ", question))
            .map(|a| a.to_lowercase());
        matches!(answer.as_deref(), Some("yes") | Some("y"))
    }

    /// Pick one of `items` by 1-based number or exact name.
    fn pick(&mut self, prompt: &str, items: &[String]) -> Result<Option<String>> {
        let Some(answer) = self.ask_trimmed(prompt) else {
            return Ok(None);
        };
        if answer.is_empty() {
            return Ok(None);
        }
        let by_number = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| items.get(i));
        if let Some(item) = by_number.or_else(|| items.iter().find(|i| **i == answer)) {
            return Ok(Some(item.clone()));
        }
        Err(HelpfulError::new(format!("Invalid selection '{}'", answer))
            .with_suggestion(format!(
                "TRY: A number from 1 to {} or one of the listed names",
                items.len()
            ))
            .into())
    }

    // === Output helpers ===

    fn report(&mut self, err: &anyhow::Error) {
        debug!("Command failed: {:#}", err);
        let lines = if let Some(helpful) = err.downcast_ref::<HelpfulError>() {
            helpful.short_lines()
        } else if let Some(store) = err.downcast_ref::<StoreError>() {
            HelpfulError::from_store(store).short_lines()
        } else if let Some(table) = err.downcast_ref::<TableError>() {
            HelpfulError::from_table(table).short_lines()
        } else {
            vec![format!("{:#}", err)]
        };
        self.sink.report_error(&lines.join("\n"));
    }

    fn unknown_command(&mut self, menu: Menu, input: &str) {
        self.sink
            .report_error(&format!("Invalid command: '{}'.", input.trim()));
        if let Some(candidate) = suggest(&normalize(input), &menu.names()) {
            self.sink
                .report_info(&format!("Did you mean '{}'?", candidate));
        }
    }

    fn autoprint(&mut self) {
        if !self.session.settings.autoprint_table {
            return;
        }
        if let Some(table) = &self.session.table {
            let snapshot = table.to_display_snapshot();
            self.sink.show_table(&snapshot);
        }
    }

    // === Table access ===

    fn table(&self) -> Result<&Table> {
        self.session.table.as_ref().ok_or_else(no_table)
    }

    fn table_mut(&mut self) -> Result<&mut Table> {
        self.session.table.as_mut().ok_or_else(no_table)
    }

    fn current_table_name(&self) -> String {
        self.session
            .table
            .as_ref()
            .map(|t| t.name().to_string())
            .unwrap_or_default()
    }

    /// True when there is nothing unsaved or the user agreed to drop it.
    fn discard_unsaved(&mut self) -> bool {
        if !self.session.has_unsaved_changes() {
            return true;
        }
        let question = format!(
            "Table '{}' has unsaved changes. Discard them?",
            self.current_table_name()
        );
        let discard = self.confirm(&question);
        if !discard {
            self.sink.report_info("Kept the current table.");
        }
        discard
    }

    fn confirm_exit(&mut self) -> bool {
        if !self.session.has_unsaved_changes() {
            return true;
        }
        let question = format!(
            "Table '{}' has unsaved changes. Exit anyway?",
            self.current_table_name()
        );
        self.confirm(&question)
    }

    // === Table builder ===

    fn table_command(&mut self, command: &str) -> Result<()> {
        match command {
            "new table" => self.new_table(),
            "add column" => self.add_column(),
            "add row" => self.add_row(),
            "remove column" => self.remove_column(),
            "remove row" => self.remove_row(),
            "edit cell" => self.edit_cell(),
            "rename column" => self.rename_column(),
            "change type" => self.change_type(),
            "print table" => {
                let snapshot = self.table()?.to_display_snapshot();
                self.sink.show_table(&snapshot);
                Ok(())
            }
            "print table data" => {
                let snapshot = self.table()?.to_display_snapshot();
                let json = serde_json::to_string_pretty(&snapshot)?;
                self.sink.show_text(&json);
                Ok(())
            }
            "rename" => self.rename_table(),
            "clear table" => {
                let table = self.table_mut()?;
                table.clear();
                let message = format!("Table '{}' cleared.", table.name());
                self.sink.report_info(&message);
                Ok(())
            }
            "save table" => self.save_table(),
            "load table" => self.load_table(),
            "load csv" => self.load_csv(),
            "export csv" => self.export(ExportFormat::Csv),
            "export json" => self.export(ExportFormat::Json),
            "export pdf" => self.export(ExportFormat::Pdf),
            other => Err(anyhow!("Unhandled table builder command '{}'", other)),
        }
    }

    fn new_table(&mut self) -> Result<()> {
        if !self.discard_unsaved() {
            return Ok(());
        }
        let Some(name) = self.ask_trimmed("Enter a name for the new table: ") else {
            return Ok(());
        };
        if name.is_empty() {
            return Err(HelpfulError::new("Table name must not be empty").into());
        }
        self.session.start_table(&name);
        info!(table = %name, "New table");
        self.sink
            .report_info(&format!("Table '{}' created.", name));
        Ok(())
    }

    fn add_column(&mut self) -> Result<()> {
        self.table()?;
        let Some(name) = self.ask_trimmed("Enter the column name: ") else {
            return Ok(());
        };
        let Some(ty) = self.ask_trimmed("Enter the column type (integer, float, text, boolean): ")
        else {
            return Ok(());
        };
        let ty = ColumnType::from_str(&ty).map_err(|e| {
            HelpfulError::new(e).with_suggestion("TRY: integer, float, text or boolean")
        })?;

        self.table_mut()?.add_column(name.as_str(), ty)?;
        self.sink
            .report_info(&format!("Column '{}' ({}) added.", name, ty));
        self.autoprint();
        Ok(())
    }

    /// Ask for every cell in column order, repeating a question until the
    /// answer fits the column. An empty answer leaves a non-text cell unset.
    fn add_row(&mut self) -> Result<()> {
        let columns = self.table()?.columns().to_vec();
        if columns.is_empty() {
            return Err(HelpfulError::new("The table has no columns")
                .with_suggestion("TRY: Add one with 'add column'")
                .into());
        }

        let mut values = Vec::with_capacity(columns.len());
        for column in &columns {
            let question = format!("Enter data for column '{}' ({}): ", column.name, column.ty);
            loop {
                let Some(literal) = self.ask(&question) else {
                    return Ok(());
                };
                match coerce(&literal, column.ty) {
                    Ok(value) => {
                        values.push(value);
                        break;
                    }
                    Err(_) => {
                        let err = TableError::type_mismatch(column.name.as_str(), column.ty, literal);
                        self.sink
                            .report_error(&HelpfulError::from_table(&err).short_lines().join("\n"));
                    }
                }
            }
        }

        let table = self.table_mut()?;
        table.push_row(values)?;
        let message = format!("Row {} added.", table.row_count());
        self.sink.report_info(&message);
        self.autoprint();
        Ok(())
    }

    fn remove_column(&mut self) -> Result<()> {
        self.table()?;
        let Some(name) = self.ask_trimmed("Enter the name of the column to remove: ") else {
            return Ok(());
        };
        self.table_mut()?.remove_column(&name)?;
        self.sink
            .report_info(&format!("Column '{}' removed.", name));
        self.autoprint();
        Ok(())
    }

    fn remove_row(&mut self) -> Result<()> {
        self.table()?;
        let Some(number) = self.ask_trimmed("Enter the number of the row to remove: ") else {
            return Ok(());
        };
        let index = row_index(&number, self.table()?.row_count())?;
        self.table_mut()?.remove_row(index)?;
        self.sink
            .report_info(&format!("Row {} removed.", index + 1));
        self.autoprint();
        Ok(())
    }

    fn edit_cell(&mut self) -> Result<()> {
        self.table()?;
        let Some(number) = self.ask_trimmed("Enter the row number of the cell: ") else {
            return Ok(());
        };
        let index = row_index(&number, self.table()?.row_count())?;
        let Some(column) = self.ask_trimmed("Enter the column name of the cell: ") else {
            return Ok(());
        };
        let ty = self
            .table()?
            .column(&column)
            .map(|c| c.ty)
            .ok_or_else(|| TableError::UnknownColumn(column.clone()))?;

        let Some(literal) = self.ask(&format!(
            "Enter new data for row {}, column '{}' ({}): ",
            index + 1,
            column,
            ty
        )) else {
            return Ok(());
        };
        self.table_mut()?.edit_cell(index, &column, &literal)?;
        self.sink.report_info(&format!(
            "Cell in row {}, column '{}' updated.",
            index + 1,
            column
        ));
        self.autoprint();
        Ok(())
    }

    fn rename_column(&mut self) -> Result<()> {
        self.table()?;
        let Some(old) = self.ask_trimmed("Enter the name of the column to rename: ") else {
            return Ok(());
        };
        let Some(new) = self.ask_trimmed("Enter the new column name: ") else {
            return Ok(());
        };
        self.table_mut()?.rename_column(&old, new.as_str())?;
        self.sink
            .report_info(&format!("Column '{}' renamed to '{}'.", old, new));
        self.autoprint();
        Ok(())
    }

    fn change_type(&mut self) -> Result<()> {
        self.table()?;
        let Some(column) = self.ask_trimmed("Enter the name of the column: ") else {
            return Ok(());
        };
        let Some(ty) = self.ask_trimmed("Enter the new type (integer, float, text, boolean): ")
        else {
            return Ok(());
        };
        let ty = ColumnType::from_str(&ty).map_err(|e| {
            HelpfulError::new(e).with_suggestion("TRY: integer, float, text or boolean")
        })?;

        let change = self.table_mut()?.change_column_type(&column, ty)?;
        self.sink
            .report_info(&describe_type_change(&column, ty, &change));
        self.autoprint();
        Ok(())
    }

    fn rename_table(&mut self) -> Result<()> {
        self.table()?;
        let Some(name) = self.ask_trimmed("Enter the new table name: ") else {
            return Ok(());
        };
        if name.is_empty() {
            return Err(HelpfulError::new("Table name must not be empty").into());
        }
        self.table_mut()?.rename(name.as_str());
        self.sink
            .report_info(&format!("Table renamed to '{}'.", name));
        self.autoprint();
        Ok(())
    }

    fn save_table(&mut self) -> Result<()> {
        let Session { table, store, .. } = &mut self.session;
        let table = table.as_mut().ok_or_else(no_table)?;
        store.save(table)?;
        let message = format!(
            "Table '{}' saved to database '{}'.",
            table.name(),
            store.current_database().unwrap_or_default()
        );
        self.sink.report_info(&message);
        Ok(())
    }

    fn load_table(&mut self) -> Result<()> {
        let relations = self.session.store.list_relations()?;
        if relations.is_empty() {
            self.sink
                .report_info("No tables found in the current database.");
            return Ok(());
        }
        self.sink.show_list("Tables", &relations);
        let Some(name) = self.pick("Enter the number or name of the table to load: ", &relations)?
        else {
            return Ok(());
        };

        let loaded = self.session.store.load(&name)?;
        if !self.discard_unsaved() {
            return Ok(());
        }
        self.sink.report_info(&format!(
            "Table '{}' loaded ({} columns, {} rows).",
            loaded.name(),
            loaded.column_count(),
            loaded.row_count()
        ));
        self.session.open_table(loaded);
        self.autoprint();
        Ok(())
    }

    fn load_csv(&mut self) -> Result<()> {
        let Some(path) = self.ask_trimmed("Enter the path of the CSV file: ") else {
            return Ok(());
        };
        if path.is_empty() {
            return Ok(());
        }
        let path = PathBuf::from(path);
        let loaded = csv_file::import_csv(&path).map_err(|e| match &e {
            ExportError::Io(io) => HelpfulError::cannot_read_file(&path, &io.to_string()),
            other => HelpfulError::csv_parse_error(&path, &other.to_string()),
        })?;

        if !self.discard_unsaved() {
            return Ok(());
        }
        self.sink.report_info(&format!(
            "Table '{}' loaded from {} ({} columns, {} rows).",
            loaded.name(),
            path.display(),
            loaded.column_count(),
            loaded.row_count()
        ));
        self.session.open_table(loaded);
        self.autoprint();
        Ok(())
    }

    fn export(&mut self, format: ExportFormat) -> Result<()> {
        let snapshot = self.table()?.to_display_snapshot();
        let default = default_output_path(&snapshot.name, format);
        let Some(answer) =
            self.ask_trimmed(&format!("Enter the output path [{}]: ", default.display()))
        else {
            return Ok(());
        };
        let path = if answer.is_empty() {
            default
        } else {
            PathBuf::from(answer)
        };

        export_snapshot(&snapshot, format, &path)
            .map_err(|e| HelpfulError::from_export(&e, &path))?;
        self.sink.report_info(&format!(
            "Table '{}' exported to {}.",
            snapshot.name,
            path.display()
        ));
        Ok(())
    }

    // === Database editor ===

    fn database_command(&mut self, command: &str) -> Result<()> {
        match command {
            "create database" => self.create_database(),
            "delete database" => self.delete_database(),
            "set database" => self.set_database(),
            "show available databases" => {
                let databases = self.session.catalog.list_databases()?;
                if databases.is_empty() {
                    self.sink.report_info("No databases found.");
                } else {
                    self.sink.show_list("Databases", &databases);
                }
                Ok(())
            }
            "show available tables" => {
                let relations = self.session.store.list_relations()?;
                let database = self
                    .session
                    .store
                    .current_database()
                    .unwrap_or_default()
                    .to_string();
                if relations.is_empty() {
                    self.sink
                        .report_info("No tables found in the current database.");
                } else {
                    self.sink
                        .show_list(&format!("Tables in '{}'", database), &relations);
                }
                Ok(())
            }
            "view table" => self.view_table(),
            "delete table" => self.delete_table(),
            "show set database" => {
                let message = match self.session.store.current_database() {
                    Some(name) => format!("Set database: {}", name),
                    None => "No database is set.".to_string(),
                };
                self.sink.report_info(&message);
                Ok(())
            }
            "close database" => {
                let Some(name) = self.session.store.current_database().map(str::to_string) else {
                    self.sink.report_info("No database is set.");
                    return Ok(());
                };
                self.session.store.close()?;
                self.sink
                    .report_info(&format!("Database '{}' closed.", name));
                Ok(())
            }
            other => Err(anyhow!("Unhandled database command '{}'", other)),
        }
    }

    fn databases_or_error(&mut self) -> Result<Vec<String>> {
        let databases = self.session.catalog.list_databases()?;
        if databases.is_empty() {
            return Err(HelpfulError::new("No databases exist yet")
                .with_suggestion("TRY: Create one with 'create database'")
                .into());
        }
        self.sink.show_list("Databases", &databases);
        Ok(databases)
    }

    fn create_database(&mut self) -> Result<()> {
        let Some(name) = self.ask_trimmed("Enter a name for the new database: ") else {
            return Ok(());
        };
        self.session.catalog.create_database(&name)?;
        self.sink.report_info(&format!(
            "Database '{}' created. Use 'set database' to work with it.",
            name
        ));
        Ok(())
    }

    fn delete_database(&mut self) -> Result<()> {
        let databases = self.databases_or_error()?;
        let Some(name) =
            self.pick("Enter the number or name of the database to delete: ", &databases)?
        else {
            return Ok(());
        };
        if !self.confirm(&format!(
            "Delete database '{}' and every table in it?",
            name
        )) {
            self.sink.report_info("Database deletion canceled.");
            return Ok(());
        }

        if self.session.store.current_database() == Some(name.as_str()) {
            self.session.store.close()?;
        }
        self.session.catalog.delete_database(&name)?;
        self.sink
            .report_info(&format!("Database '{}' deleted.", name));
        Ok(())
    }

    fn set_database(&mut self) -> Result<()> {
        let databases = self.databases_or_error()?;
        let Some(name) = self.pick("Enter the number or name of the database to use: ", &databases)?
        else {
            return Ok(());
        };
        let Session { store, catalog, .. } = &mut self.session;
        store.connect(catalog, &name)?;
        self.sink.report_info(&format!(
            "Database '{}' is now set as the current database.",
            name
        ));
        Ok(())
    }

    fn stored_tables_or_info(&mut self) -> Result<Option<Vec<String>>> {
        let relations = self.session.store.list_relations()?;
        if relations.is_empty() {
            self.sink
                .report_info("No tables found in the current database.");
            return Ok(None);
        }
        self.sink.show_list("Tables", &relations);
        Ok(Some(relations))
    }

    fn view_table(&mut self) -> Result<()> {
        let Some(relations) = self.stored_tables_or_info()? else {
            return Ok(());
        };
        let Some(name) = self.pick("Enter the number or name of the table to view: ", &relations)?
        else {
            return Ok(());
        };
        let table = self.session.store.load(&name)?;
        if table.row_count() == 0 {
            self.sink
                .report_info(&format!("Table '{}' is empty.", name));
        }
        self.sink.show_table(&table.to_display_snapshot());
        Ok(())
    }

    fn delete_table(&mut self) -> Result<()> {
        let Some(relations) = self.stored_tables_or_info()? else {
            return Ok(());
        };
        let Some(name) =
            self.pick("Enter the number or name of the table to delete: ", &relations)?
        else {
            return Ok(());
        };
        if !self.confirm(&format!("Delete table '{}'?", name)) {
            self.sink.report_info("Table deletion canceled.");
            return Ok(());
        }
        self.session.store.delete_relation(&name)?;
        self.sink
            .report_info(&format!("Table '{}' deleted.", name));
        Ok(())
    }

    // === Settings ===

    fn settings_command(&mut self, command: &str) -> Result<()> {
        match command {
            "autoprint table" => {
                let Some(answer) = self.ask_trimmed("Turn autoprint table on or off: ") else {
                    return Ok(());
                };
                let on = parse_on_off(&answer).ok_or_else(|| {
                    HelpfulError::new(format!("Expected 'on' or 'off', got '{}'", answer))
                })?;
                self.session.set_autoprint(on)?;
                self.sink
                    .report_info(&format!("autoprint_table is now {}.", on_off(on)));
                Ok(())
            }
            "print settings" => {
                let rows = self
                    .session
                    .settings
                    .describe()
                    .into_iter()
                    .map(|(name, description, value)| {
                        vec![name.to_string(), description.to_string(), value]
                    })
                    .collect();
                let table = build_table(&["setting", "description", "value"], rows);
                self.sink.show_text(&table.to_string());
                Ok(())
            }
            other => Err(anyhow!("Unhandled settings command '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::prompt::{RecordingSink, ScriptedPrompt, Shown};
    use tablewright_db::Catalog;
    use tempfile::TempDir;

    fn run_script(temp: &TempDir, answers: &[&str]) -> (Session, ScriptedPrompt, RecordingSink) {
        let session = Session::new(
            Catalog::new(temp.path().join("db")),
            temp.path().join("settings.toml"),
        );
        let mut shell = Shell::new(
            session,
            ScriptedPrompt::new(answers.iter().copied()),
            RecordingSink::new(),
        );
        shell.run();
        shell.into_parts()
    }

    #[test]
    fn test_row_index_is_one_based() {
        assert_eq!(row_index("1", 3).unwrap(), 0);
        assert_eq!(row_index(" 3 ", 3).unwrap(), 2);
        assert!(row_index("0", 3).is_err());
        assert!(row_index("4", 3).is_err());
        assert!(row_index("two", 3).is_err());
        assert!(row_index("1", 0).is_err());
    }

    #[test]
    fn test_describe_type_change_lists_cleared_rows() {
        let change = TypeChange {
            converted: 2,
            cleared: vec![0, 3],
        };
        let message = describe_type_change("age", ColumnType::Integer, &change);
        assert!(message.contains("now integer"));
        assert!(message.contains("row(s) 1, 4"));
    }

    #[test]
    fn test_unknown_command_suggests() {
        let temp = TempDir::new().unwrap();
        let (_, _, sink) = run_script(&temp, &["tabel builder", "exit"]);

        assert_eq!(sink.errors(), vec!["Invalid command: 'tabel builder'."]);
        assert!(sink
            .infos()
            .contains(&"Did you mean 'table builder'?"));
    }

    #[test]
    fn test_add_row_reprompts_until_valid() {
        let temp = TempDir::new().unwrap();
        let (session, _, sink) = run_script(
            &temp,
            &[
                "table builder",
                "people",
                "add column",
                "age",
                "integer",
                "add row",
                "abc",
                "42",
                "exit",
                "exit",
                "yes",
            ],
        );

        let table = session.table.unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "age").unwrap().to_string(), "42");
        assert_eq!(sink.errors().len(), 1);
        assert!(sink.errors()[0].contains("'age'"));
    }

    #[test]
    fn test_exit_with_unsaved_changes_can_be_declined() {
        let temp = TempDir::new().unwrap();
        let (_, prompt, _) = run_script(
            &temp,
            &[
                "table builder",
                "t",
                "add column",
                "a",
                "text",
                "exit",
                "exit",
                "no",
                "help",
            ],
        );

        let asked = prompt.asked();
        assert!(asked.iter().any(|q| q.contains("Exit anyway?")));
        // declining keeps the main menu running until input ends
        assert_eq!(asked.last().map(String::as_str), Some("Main Menu > "));
    }

    #[test]
    fn test_autoprint_shows_table_after_changes() {
        let temp = TempDir::new().unwrap();
        let (_, _, sink) = run_script(
            &temp,
            &[
                "settings",
                "autoprint table",
                "on",
                "exit",
                "table builder",
                "t",
                "add column",
                "flag",
                "boolean",
            ],
        );

        assert_eq!(sink.tables().len(), 1);
        assert!(sink
            .shown
            .iter()
            .any(|s| matches!(s, Shown::Info(m) if m == "autoprint_table is now on.")));
    }
}
