//! State of one interactive session.

use std::path::{Path, PathBuf};

use tablewright_db::{Catalog, Store};
use tablewright_model::Table;
use tracing::warn;

use super::config::{self, Settings};

/// Everything the shell works on: the table being edited, the current
/// database, the catalog of databases and the user settings.
#[derive(Debug)]
pub struct Session {
    pub table: Option<Table>,
    pub store: Store,
    pub catalog: Catalog,
    pub settings: Settings,
    settings_path: PathBuf,
    /// The table as `start_table` created it, until it is replaced.
    started_blank: Option<Table>,
}

impl Session {
    pub fn new(catalog: Catalog, settings_path: PathBuf) -> Self {
        let settings = Settings::load(&settings_path);
        Self {
            table: None,
            store: Store::new(),
            catalog,
            settings,
            settings_path,
            started_blank: None,
        }
    }

    /// Session over the configured home directory.
    pub fn from_home() -> Self {
        Self::new(config::default_catalog(), config::settings_path())
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Make a new empty table current.
    pub fn start_table(&mut self, name: &str) {
        let table = Table::new(name);
        self.started_blank = Some(table.clone());
        self.table = Some(table);
    }

    /// Make a loaded or imported table current.
    pub fn open_table(&mut self, table: Table) {
        self.started_blank = None;
        self.table = Some(table);
    }

    /// The current table changed since it was last saved or loaded.
    ///
    /// A table fresh from [`Session::start_table`] that nobody touched has
    /// nothing to lose.
    pub fn has_unsaved_changes(&self) -> bool {
        match &self.table {
            Some(table) => !table.is_saved() && self.started_blank.as_ref() != Some(table),
            None => false,
        }
    }

    pub fn set_autoprint(&mut self, on: bool) -> anyhow::Result<()> {
        self.settings.autoprint_table = on;
        self.settings.save(&self.settings_path)
    }

    /// Close the current database, if any.
    pub fn close(&mut self) {
        if let Err(e) = self.store.close() {
            warn!("Failed to close database cleanly: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablewright_model::ColumnType;
    use tempfile::TempDir;

    #[test]
    fn test_unsaved_changes_tracking() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::new(
            Catalog::new(temp.path().join("db")),
            temp.path().join("settings.toml"),
        );
        assert!(!session.has_unsaved_changes());

        session.start_table("t");
        assert!(!session.has_unsaved_changes());

        let table = session.table.as_mut().unwrap();
        table.add_column("a", ColumnType::Text).unwrap();
        assert!(session.has_unsaved_changes());

        // emptying it again is still a change from the last save
        let table = session.table.as_mut().unwrap();
        table.remove_column("a").unwrap();
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_renamed_blank_table_is_unsaved() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::new(Catalog::new(temp.path()), temp.path().join("s.toml"));

        session.start_table("draft");
        session.table.as_mut().unwrap().rename("final");
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_cleared_loaded_table_is_unsaved() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::new(Catalog::new(temp.path()), temp.path().join("s.toml"));

        let mut loaded = Table::new("t");
        loaded.add_column("a", ColumnType::Text).unwrap();
        loaded.mark_saved();
        session.open_table(loaded);
        assert!(!session.has_unsaved_changes());

        session.table.as_mut().unwrap().remove_column("a").unwrap();
        assert_eq!(session.table.as_ref().unwrap().column_count(), 0);
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_autoprint_persists() {
        let temp = TempDir::new().unwrap();
        let settings_path = temp.path().join("settings.toml");
        let mut session = Session::new(Catalog::new(temp.path()), settings_path.clone());

        session.set_autoprint(true).unwrap();

        let reopened = Session::new(Catalog::new(temp.path()), settings_path);
        assert!(reopened.settings.autoprint_table);
    }
}
