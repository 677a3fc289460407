//! Directory of named database files.
//!
//! Each database is one SQLite file `<dir>/<name>.db`. The catalog only deals
//! with files; opening one is the [`Store`](crate::Store)'s job.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};
use crate::lock::{is_locked, remove_lock_files};

/// File extension used for database files.
pub const DB_EXTENSION: &str = "db";

/// A directory holding database files.
#[derive(Debug, Clone)]
pub struct Catalog {
    dir: PathBuf,
}

impl Catalog {
    /// Catalog rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing database `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, DB_EXTENSION))
    }

    /// Whether a database file called `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.path_for(name).is_file()
    }

    /// Names of all databases in the catalog, sorted.
    ///
    /// A missing directory is an empty catalog.
    pub fn list_databases(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(DB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Create an empty database file.
    #[instrument(skip(self))]
    pub fn create_database(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                info!("Created database {}", path.display());
                Ok(path)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::DatabaseExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a database file and any lock files next to it.
    ///
    /// Refuses while the database is open, in this process or another.
    #[instrument(skip(self))]
    pub fn delete_database(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(StoreError::DatabaseNotFound(name.to_string()));
        }
        if is_locked(&path) {
            return Err(StoreError::Locked(name.to_string()));
        }

        fs::remove_file(&path)?;
        remove_lock_files(&path)?;
        for suffix in ["-journal", "-wal", "-shm"] {
            let side = self.dir.join(format!("{}.{}{}", name, DB_EXTENSION, suffix));
            if side.exists() {
                debug!("Removing {}", side.display());
                fs::remove_file(side)?;
            }
        }
        info!("Deleted database {}", path.display());
        Ok(())
    }
}

/// Database names become file names: ASCII letters, digits, `_` and `-`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::invalid_name(name, "name is empty"));
    }
    if name.starts_with('-') {
        return Err(StoreError::invalid_name(name, "name cannot start with '-'"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(StoreError::invalid_name(
            name,
            format!("character '{}' is not allowed (use letters, digits, '_' or '-')", bad),
        ));
    }
    Ok(())
}
