//! Command catalog for the interactive shell.
//!
//! Each menu accepts a fixed list of commands. Input is matched after
//! [`normalize`], so `Add_Column` and `add   column` both select
//! `add column`.

/// One command of a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
}

const fn cmd(name: &'static str, help: &'static str) -> CommandSpec {
    CommandSpec { name, help }
}

pub const MAIN_MENU: &[CommandSpec] = &[
    cmd("table builder", "Enter the table builder."),
    cmd("database", "Enter the database editor."),
    cmd("settings", "Enter the settings."),
    cmd("help", "Prints this screen."),
    cmd("exit", "Exit the application."),
];

pub const TABLE_BUILDER: &[CommandSpec] = &[
    cmd("new table", "Starts a new, empty table."),
    cmd("add column", "Add a column to the table."),
    cmd("add row", "Add a row to the table."),
    cmd("remove column", "Removes a column from the table."),
    cmd("remove row", "Removes a row from the table."),
    cmd("edit cell", "Edit the content of a cell in the table."),
    cmd("rename column", "Renames a column."),
    cmd("change type", "Changes a column's type; cells that do not fit are unset."),
    cmd("print table", "Prints the table to the screen."),
    cmd("print table data", "Prints the JSON data for the table."),
    cmd("rename", "Renames the table."),
    cmd("clear table", "Removes every column and row."),
    cmd("save table", "Saves the table to the currently set database."),
    cmd("load table", "Loads a table from the currently set database."),
    cmd("load csv", "Loads a CSV file as a table of text columns."),
    cmd("export csv", "Writes the table to a CSV file."),
    cmd("export json", "Writes the table to a JSON file."),
    cmd("export pdf", "Writes the table to a PDF file."),
    cmd("help", "Prints this screen."),
    cmd("exit", "Go back to the main menu."),
];

pub const DATABASE: &[CommandSpec] = &[
    cmd("create database", "Creates a new database."),
    cmd("delete database", "Deletes an existing database."),
    cmd("set database", "Sets a database as the current working database."),
    cmd("show available databases", "Prints the list of databases."),
    cmd("show available tables", "Prints the tables in the current database."),
    cmd("view table", "Prints a saved table from the current database."),
    cmd("delete table", "Deletes a table from the current database."),
    cmd("show set database", "Shows the current database."),
    cmd("close database", "Closes the current database."),
    cmd("help", "Prints this screen."),
    cmd("exit", "Go back to the main menu."),
];

pub const SETTINGS: &[CommandSpec] = &[
    cmd("autoprint table", "Turn automatic table printing on or off."),
    cmd("print settings", "Shows the current settings."),
    cmd("help", "Prints this screen."),
    cmd("exit", "Go back to the main menu."),
];

/// The shell's menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Main,
    TableBuilder,
    Database,
    Settings,
}

impl Menu {
    pub fn title(&self) -> &'static str {
        match self {
            Menu::Main => "Main Menu",
            Menu::TableBuilder => "Table Builder",
            Menu::Database => "Database",
            Menu::Settings => "Settings",
        }
    }

    pub fn commands(&self) -> &'static [CommandSpec] {
        match self {
            Menu::Main => MAIN_MENU,
            Menu::TableBuilder => TABLE_BUILDER,
            Menu::Database => DATABASE,
            Menu::Settings => SETTINGS,
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.commands().iter().map(|c| c.name).collect()
    }

    /// Resolve user input to a command name of this menu.
    pub fn lookup(&self, input: &str) -> Option<&'static str> {
        let wanted = normalize(input);
        self.commands()
            .iter()
            .find(|c| c.name == wanted)
            .map(|c| c.name)
    }
}

/// Lowercase, treat `_` as a space and collapse runs of whitespace.
pub fn normalize(input: &str) -> String {
    input
        .replace('_', " ")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_normalizes_input() {
        assert_eq!(Menu::TableBuilder.lookup("Add_Column"), Some("add column"));
        assert_eq!(Menu::TableBuilder.lookup("  print   table data "), Some("print table data"));
        assert_eq!(Menu::Database.lookup("SET DATABASE"), Some("set database"));
        assert_eq!(Menu::Main.lookup("add column"), None);
    }

    #[test]
    fn test_every_menu_has_help_and_exit() {
        for menu in [Menu::Main, Menu::TableBuilder, Menu::Database, Menu::Settings] {
            assert!(menu.lookup("help").is_some(), "{:?}", menu);
            assert!(menu.lookup("exit").is_some(), "{:?}", menu);
        }
    }

    #[test]
    fn test_command_names_unique_per_menu() {
        for menu in [Menu::Main, Menu::TableBuilder, Menu::Database, Menu::Settings] {
            let mut names = menu.names();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), menu.commands().len());
        }
    }
}
