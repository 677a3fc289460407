//! One session per database file.
//!
//! Opening `<name>.db` takes an exclusive advisory lock on `<name>.db.lock`
//! for as long as the connection lives. While held, `<name>.db.lock.json`
//! records the holder's pid, executable and start time, so a second session
//! can say who has the database open.

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LockError {
    /// Some other handle holds the lock.
    #[error("Database file {0} is held by another session")]
    Locked(PathBuf),

    #[error("Cannot open lock file: {0}")]
    CreateFailed(#[source] io::Error),

    #[error("Cannot lock database file: {0}")]
    AcquireFailed(#[source] io::Error),
}

/// Contents of the holder sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub exe: Option<String>,
    /// RFC 3339 time the lock was taken.
    pub timestamp: String,
}

impl LockHolder {
    fn this_process() -> Self {
        Self {
            pid: std::process::id(),
            exe: std::env::current_exe()
                .ok()
                .map(|exe| exe.display().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Holds the lock on one database file until dropped.
pub struct DbLockGuard {
    // the advisory lock lives as long as this handle
    _handle: File,
    lock_path: PathBuf,
    holder_path: Option<PathBuf>,
}

impl DbLockGuard {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl std::fmt::Debug for DbLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbLockGuard")
            .field("lock_path", &self.lock_path)
            .field("holder_path", &self.holder_path)
            .finish()
    }
}

impl Drop for DbLockGuard {
    fn drop(&mut self) {
        if let Some(holder_path) = self.holder_path.take() {
            if let Err(e) = fs::remove_file(&holder_path) {
                debug!("Could not remove {}: {}", holder_path.display(), e);
            }
        }
        debug!("Released {}", self.lock_path.display());
    }
}

/// `shop.db` locks through `shop.db.lock`; a path without extension gets `.lock`.
pub fn lock_path_for(db_path: &Path) -> PathBuf {
    let extension = match db_path.extension() {
        Some(ext) => format!("{}.lock", ext.to_string_lossy()),
        None => "lock".to_string(),
    };
    db_path.with_extension(extension)
}

fn holder_path_for(db_path: &Path) -> PathBuf {
    let mut name = lock_path_for(db_path).into_os_string();
    name.push(".json");
    PathBuf::from(name)
}

fn record_holder(db_path: &Path) -> Option<PathBuf> {
    let holder_path = holder_path_for(db_path);
    let written = serde_json::to_vec_pretty(&LockHolder::this_process())
        .map_err(io::Error::from)
        .and_then(|payload| fs::write(&holder_path, payload));
    match written {
        Ok(()) => Some(holder_path),
        Err(e) => {
            warn!("Could not record lock holder in {}: {}", holder_path.display(), e);
            None
        }
    }
}

/// Lock `db_path` without waiting.
///
/// Fails with [`LockError::Locked`] when any other handle, in this process
/// or another, already holds it.
pub fn try_lock_exclusive(db_path: &Path) -> Result<DbLockGuard, LockError> {
    let lock_path = lock_path_for(db_path);
    let handle = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(LockError::CreateFailed)?;

    // fs2's trait method; newer std has an inherent one with the same name
    if let Err(e) = FileExt::try_lock_exclusive(&handle) {
        return if e.kind() == io::ErrorKind::WouldBlock {
            debug!("{} is held elsewhere", lock_path.display());
            Err(LockError::Locked(db_path.to_path_buf()))
        } else {
            Err(LockError::AcquireFailed(e))
        };
    }

    debug!("Locked {}", lock_path.display());
    Ok(DbLockGuard {
        _handle: handle,
        holder_path: record_holder(db_path),
        lock_path,
    })
}

/// Whether some session holds `db_path`. Probes by locking and releasing.
pub fn is_locked(db_path: &Path) -> bool {
    match try_lock_exclusive(db_path) {
        Ok(_probe) => false,
        Err(LockError::Locked(_)) => true,
        Err(e) => {
            warn!("Lock probe on {} failed: {}", db_path.display(), e);
            false
        }
    }
}

/// The recorded holder of `db_path`, if it is locked and the record is readable.
pub fn lock_holder(db_path: &Path) -> Option<LockHolder> {
    let payload = fs::read(holder_path_for(db_path)).ok()?;
    serde_json::from_slice(&payload).ok()
}

/// Delete the lock file and holder record of `db_path`. Missing files are fine.
pub fn remove_lock_files(db_path: &Path) -> io::Result<()> {
    for path in [holder_path_for(db_path), lock_path_for(db_path)] {
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(e);
            }
        }
    }
    Ok(())
}
