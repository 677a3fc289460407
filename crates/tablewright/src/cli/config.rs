//! Configuration paths and user settings for Tablewright
//!
//! Paths resolve under `$TABLEWRIGHT_HOME` (default `~/.tablewright/`).
//! User settings live in `settings.toml` there.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use tablewright_logging::{db_dir, logs_dir, settings_path, tablewright_home};

use tablewright_db::Catalog;

/// Line editor history: `<home>/history`
pub fn history_path() -> PathBuf {
    tablewright_home().join("history")
}

/// Catalog over the database directory.
pub fn default_catalog() -> Catalog {
    Catalog::new(db_dir())
}

/// User settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Print the table after every change made in the table builder.
    pub autoprint_table: bool,
}

impl Settings {
    /// Names, descriptions and current values, for display.
    pub fn describe(&self) -> Vec<(&'static str, &'static str, String)> {
        vec![(
            "autoprint_table",
            "Automatically prints the table after a change has been made.",
            on_off(self.autoprint_table).to_string(),
        )]
    }

    /// Read settings from `path`. A missing or unreadable file gives defaults.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No settings at {} ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Ignoring corrupt settings file {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

pub fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Parse `on`/`off` as typed by the user.
pub fn parse_on_off(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run the config command - shows current paths and settings
pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let home = tablewright_home();
    let db = db_dir();
    let logs = logs_dir();
    let settings_file = settings_path();
    let settings = Settings::load(&settings_file);
    let databases = Catalog::new(&db).list_databases()?;

    if args.json {
        let config = serde_json::json!({
            "home": home.to_string_lossy(),
            "databases": {
                "path": db.to_string_lossy(),
                "exists": db.exists(),
                "count": databases.len(),
            },
            "logs": {
                "path": logs.to_string_lossy(),
                "exists": logs.exists(),
            },
            "settings": {
                "path": settings_file.to_string_lossy(),
                "exists": settings_file.exists(),
                "values": settings,
            },
        });
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("TABLEWRIGHT CONFIGURATION");
        println!("=========================");
        println!();
        println!("Home:      {}", home.display());
        println!();
        println!(
            "Databases: {} ({})",
            db.display(),
            if db.exists() {
                format!("{} found", databases.len())
            } else {
                "not created yet".to_string()
            }
        );
        println!("Logs:      {}", logs.display());
        println!(
            "Settings:  {} ({})",
            settings_file.display(),
            if settings_file.exists() { "exists" } else { "defaults" }
        );
        for (name, _, value) in settings.describe() {
            println!("  {} = {}", name, value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("settings.toml");

        let settings = Settings {
            autoprint_table: true,
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn test_missing_or_corrupt_settings_use_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        assert_eq!(Settings::load(&path), Settings::default());

        std::fs::write(&path, "autoprint_table = [not toml").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());

        std::fs::write(&path, "unknown_key = 1\n").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_parse_on_off() {
        assert_eq!(parse_on_off(" ON "), Some(true));
        assert_eq!(parse_on_off("off"), Some(false));
        assert_eq!(parse_on_off("yes"), None);
    }
}
