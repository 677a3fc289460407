//! Thin synchronous wrapper over one SQLite file.
//!
//! Every statement goes through [`traced`], which opens a debug span carrying
//! the statement's leading keyword and a stable fingerprint of its text. A
//! file connection also owns the file's [`DbLockGuard`], so a database is
//! open in at most one session at a time.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use thiserror::Error;
use tracing::{debug_span, info};

use crate::lock::{try_lock_exclusive, DbLockGuard, LockError};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Cannot open database: {0}")]
    Database(String),

    /// The file lock is held by another session.
    #[error("Database {0} is already open elsewhere")]
    Locked(String),

    #[error("Query returned nothing usable: {0}")]
    Query(String),

    #[error("Could not finish transaction: {0}")]
    Transaction(String),

    #[error("Unexpected column value: {0}")]
    TypeConversion(String),

    #[error("Bad statement input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl From<LockError> for BackendError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Locked(path) => BackendError::Locked(path.display().to_string()),
            other => BackendError::Database(other.to_string()),
        }
    }
}

/// A bound parameter or a fetched cell.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// Written as 0 or 1. Reads never produce this variant.
    Boolean(bool),
}

macro_rules! db_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for DbValue {
            fn from(v: $ty) -> Self {
                DbValue::$variant(v.into())
            }
        })*
    };
}

db_value_from! {
    i64 => Integer,
    f64 => Real,
    String => Text,
    &str => Text,
    bool => Boolean,
}

impl DbValue {
    fn to_sql(&self) -> SqlValue {
        match self {
            DbValue::Null => SqlValue::Null,
            DbValue::Integer(v) => SqlValue::Integer(*v),
            DbValue::Boolean(v) => SqlValue::Integer(i64::from(*v)),
            DbValue::Real(v) => SqlValue::Real(*v),
            DbValue::Text(v) => SqlValue::Text(v.clone()),
            DbValue::Blob(v) => SqlValue::Blob(v.clone()),
        }
    }

    fn from_sql(cell: ValueRef<'_>) -> Self {
        match cell {
            ValueRef::Null => DbValue::Null,
            ValueRef::Integer(v) => DbValue::Integer(v),
            ValueRef::Real(v) => DbValue::Real(v),
            ValueRef::Text(bytes) => DbValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => DbValue::Blob(bytes.to_vec()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            DbValue::Null => "NULL",
            DbValue::Integer(_) => "integer",
            DbValue::Real(_) => "real",
            DbValue::Text(_) => "text",
            DbValue::Blob(_) => "blob",
            DbValue::Boolean(_) => "boolean",
        }
    }
}

/// One fetched row, in select-list order.
#[derive(Debug, Clone)]
pub struct DbRow {
    values: Vec<DbValue>,
}

impl DbRow {
    pub fn get<T: FromDbValue>(&self, index: usize) -> Result<T, BackendError> {
        let cell = self.values.get(index).ok_or_else(|| {
            BackendError::TypeConversion(format!(
                "row has {} columns, no column {}",
                self.values.len(),
                index
            ))
        })?;
        T::from_db_value(cell)
    }

    pub fn into_values(self) -> Vec<DbValue> {
        self.values
    }
}

/// Typed extraction from a fetched cell.
pub trait FromDbValue: Sized {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError>;
}

fn mismatch<T>(wanted: &str, got: &DbValue) -> Result<T, BackendError> {
    Err(BackendError::TypeConversion(format!(
        "wanted {}, found {}",
        wanted,
        got.kind()
    )))
}

impl FromDbValue for i64 {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Integer(v) => Ok(*v),
            DbValue::Boolean(v) => Ok(i64::from(*v)),
            other => mismatch("integer", other),
        }
    }
}

impl FromDbValue for f64 {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Real(v) => Ok(*v),
            DbValue::Integer(v) => Ok(*v as f64),
            other => mismatch("real", other),
        }
    }
}

impl FromDbValue for bool {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Boolean(v) => Ok(*v),
            DbValue::Integer(v) => Ok(*v != 0),
            other => mismatch("boolean", other),
        }
    }
}

impl FromDbValue for String {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Text(v) => Ok(v.clone()),
            other => mismatch("text", other),
        }
    }
}

impl<T: FromDbValue> FromDbValue for Option<T> {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        if *value == DbValue::Null {
            Ok(None)
        } else {
            T::from_db_value(value).map(Some)
        }
    }
}

/// An open database plus, for files, the lock that keeps it ours.
pub struct DbConnection {
    conn: Connection,
    path: Option<PathBuf>,
    // dropped after `conn`, so the lock outlives the connection
    _lock: Option<DbLockGuard>,
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "DbConnection({})", path.display()),
            None => f.write_str("DbConnection(:memory:)"),
        }
    }
}

impl DbConnection {
    /// Lock `path`, then open it. [`BackendError::Locked`] when another
    /// session has it.
    pub fn open_sqlite(path: &Path) -> Result<Self, BackendError> {
        let lock = try_lock_exclusive(path)?;
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "database opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            _lock: Some(lock),
        })
    }

    pub fn open_sqlite_memory() -> Result<Self, BackendError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
            _lock: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close the connection and report any error SQLite raises doing so.
    /// The lock goes with it.
    pub fn close(self) -> Result<(), BackendError> {
        let Self { conn, path, _lock } = self;
        conn.close().map_err(|(_, err)| BackendError::Sqlite(err))?;
        if let Some(path) = path {
            info!(path = %path.display(), "database closed");
        }
        Ok(())
    }

    pub fn execute(&self, sql: &str, params: &[DbValue]) -> Result<u64, BackendError> {
        run_statement(&self.conn, sql, params)
    }

    pub fn execute_batch(&self, sql: &str) -> Result<(), BackendError> {
        run_script(&self.conn, sql)
    }

    pub fn query_all(&self, sql: &str, params: &[DbValue]) -> Result<Vec<DbRow>, BackendError> {
        fetch_rows(&self.conn, sql, params)
    }

    /// First column of the first row.
    pub fn query_scalar<T: FromDbValue>(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<T, BackendError> {
        match fetch_rows(&self.conn, sql, params)?.first() {
            Some(row) => row.get(0),
            None => Err(BackendError::Query(format!(
                "no rows from {}",
                statement_keyword(sql)
            ))),
        }
    }

    /// Run `body` between `BEGIN IMMEDIATE` and `COMMIT`. Any error from
    /// `body`, or from the commit itself, rolls everything back and is
    /// handed to the caller.
    pub fn transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut DbTransaction<'_>) -> Result<T, E>,
        E: From<BackendError> + std::fmt::Display,
    {
        run_script(&self.conn, "BEGIN IMMEDIATE")?;
        match body(&mut DbTransaction { conn: &self.conn }) {
            Ok(value) => match run_script(&self.conn, "COMMIT") {
                Ok(()) => Ok(value),
                Err(commit) => match self.roll_back() {
                    Ok(()) => Err(commit.into()),
                    Err(rollback) => Err(rollback_failed(&commit, &rollback).into()),
                },
            },
            Err(failure) => match self.roll_back() {
                Ok(()) => Err(failure),
                Err(rollback) => Err(rollback_failed(&failure, &rollback).into()),
            },
        }
    }

    // SQLite ends the transaction itself after some errors; a second
    // ROLLBACK would then fail with "no transaction is active".
    fn roll_back(&self) -> Result<(), BackendError> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        run_script(&self.conn, "ROLLBACK")
    }
}

fn rollback_failed(cause: &dyn std::fmt::Display, rollback: &BackendError) -> BackendError {
    BackendError::Transaction(format!(
        "{} (and the rollback failed too: {})",
        cause, rollback
    ))
}

/// Statements issued inside [`DbConnection::transaction`].
pub struct DbTransaction<'a> {
    conn: &'a Connection,
}

impl DbTransaction<'_> {
    pub fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64, BackendError> {
        run_statement(self.conn, sql, params)
    }

    pub fn execute_batch(&mut self, sql: &str) -> Result<(), BackendError> {
        run_script(self.conn, sql)
    }

    pub fn query_all(&mut self, sql: &str, params: &[DbValue]) -> Result<Vec<DbRow>, BackendError> {
        fetch_rows(self.conn, sql, params)
    }

    /// Insert `rows` into `table`; each row lines up with `columns`.
    pub fn insert_rows(
        &mut self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<DbValue>],
    ) -> Result<u64, BackendError> {
        if rows.is_empty() {
            return Ok(0);
        }
        if columns.is_empty() {
            return Err(BackendError::InvalidInput(format!(
                "no columns given for {}",
                table
            )));
        }
        if let Some((at, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(BackendError::InvalidInput(format!(
                "row {} carries {} values for {} columns",
                at,
                row.len(),
                columns.len()
            )));
        }

        let column_list: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let slots = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            column_list.join(", "),
            slots
        );

        rows.iter()
            .map(|row| run_statement(self.conn, &sql, row))
            .sum()
    }
}

/// Wrap `work` in a `db` debug span and record how long it took.
fn traced<T>(
    kind: &'static str,
    sql: &str,
    work: impl FnOnce() -> Result<T, BackendError>,
) -> Result<T, BackendError> {
    let span = debug_span!(
        "db",
        kind,
        stmt = statement_keyword(sql),
        fingerprint = %fingerprint(sql),
        elapsed_ms = tracing::field::Empty
    );
    let _entered = span.enter();
    let started = Instant::now();
    let result = work();
    span.record("elapsed_ms", started.elapsed().as_millis() as u64);
    result
}

fn run_statement(conn: &Connection, sql: &str, params: &[DbValue]) -> Result<u64, BackendError> {
    traced("execute", sql, || {
        let mut stmt = conn.prepare_cached(sql)?;
        let changed = stmt.execute(params_from_iter(params.iter().map(DbValue::to_sql)))?;
        Ok(changed as u64)
    })
}

fn run_script(conn: &Connection, sql: &str) -> Result<(), BackendError> {
    traced("batch", sql, || Ok(conn.execute_batch(sql)?))
}

fn fetch_rows(conn: &Connection, sql: &str, params: &[DbValue]) -> Result<Vec<DbRow>, BackendError> {
    traced("query", sql, || {
        let mut stmt = conn.prepare_cached(sql)?;
        let width = stmt.column_count();
        let mut cursor = stmt.query(params_from_iter(params.iter().map(DbValue::to_sql)))?;

        let mut rows = Vec::new();
        while let Some(row) = cursor.next()? {
            let values = (0..width)
                .map(|i| row.get_ref(i).map(DbValue::from_sql))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(DbRow { values });
        }
        Ok(rows)
    })
}

/// Double-quote `name` for use as an SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn statement_keyword(sql: &str) -> &str {
    sql.split_whitespace().next().unwrap_or("?")
}

/// FNV-1a over the statement text, so spans can be grouped by statement
/// without logging table contents.
fn fingerprint(sql: &str) -> String {
    let hash = sql.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |acc, byte| {
        (acc ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    });
    format!("{:016x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory_with(schema: &str) -> DbConnection {
        let conn = DbConnection::open_sqlite_memory().unwrap();
        conn.execute_batch(schema).unwrap();
        conn
    }

    #[test]
    fn test_insert_rows_counts_inserted() {
        let conn = memory_with("CREATE TABLE t (id INTEGER, label TEXT)");
        let rows = vec![
            vec![DbValue::from(1_i64), DbValue::from("one")],
            vec![DbValue::from(2_i64), DbValue::Null],
        ];

        let inserted = conn
            .transaction(|tx| tx.insert_rows("t", &["id", "label"], &rows))
            .unwrap();
        assert_eq!(inserted, 2);

        let labels = conn
            .query_all("SELECT label FROM t ORDER BY id", &[])
            .unwrap()
            .into_iter()
            .map(|row| row.get::<Option<String>>(0).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec![Some("one".to_string()), None]);
    }

    #[test]
    fn test_insert_rows_checks_width_before_writing() {
        let conn = memory_with("CREATE TABLE t (id INTEGER, label TEXT)");
        let rows = vec![
            vec![DbValue::from(1_i64), DbValue::from("one")],
            vec![DbValue::from(2_i64)],
        ];

        let err = conn
            .transaction(|tx| tx.insert_rows("t", &["id", "label"], &rows))
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidInput(_)));
        let count: i64 = conn.query_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_failed_transaction_leaves_no_trace() {
        let conn = memory_with("CREATE TABLE t (id INTEGER)");

        let result: Result<(), BackendError> = conn.transaction(|tx| {
            tx.execute("INSERT INTO t (id) VALUES (?1)", &[DbValue::from(7_i64)])?;
            tx.execute_batch("DROP TABLE t")?;
            Err(BackendError::Query("stop".to_string()))
        });

        assert!(result.is_err());
        let count: i64 = conn.query_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let conn = memory_with(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (pid INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED);",
        );

        // the deferred foreign key is only checked at COMMIT
        let err = conn
            .transaction(|tx| tx.execute("INSERT INTO child VALUES (1)", &[]))
            .unwrap_err();
        assert!(matches!(err, BackendError::Sqlite(_)), "{}", err);

        let inserted = conn
            .transaction(|tx| tx.execute("INSERT INTO parent VALUES (1)", &[]))
            .unwrap();
        assert_eq!(inserted, 1);
        let orphans: i64 = conn.query_scalar("SELECT COUNT(*) FROM child", &[]).unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_boolean_written_as_integer() {
        let conn = memory_with("CREATE TABLE t (flag BOOLEAN)");
        conn.execute("INSERT INTO t VALUES (?1)", &[DbValue::from(true)])
            .unwrap();

        let row = conn.query_all("SELECT flag FROM t", &[]).unwrap().remove(0);
        assert!(row.get::<bool>(0).unwrap());
        assert_eq!(row.into_values(), vec![DbValue::Integer(1)]);
    }

    #[test]
    fn test_typed_get_reports_mismatch() {
        let conn = memory_with("CREATE TABLE t (n INTEGER); INSERT INTO t VALUES (NULL);");
        let row = conn.query_all("SELECT n FROM t", &[]).unwrap().remove(0);

        assert_eq!(row.get::<Option<i64>>(0).unwrap(), None);
        let err = row.get::<i64>(0).unwrap_err();
        assert!(err.to_string().contains("found NULL"), "{}", err);
        assert!(row.get::<i64>(3).is_err());
    }

    #[test]
    fn test_scalar_on_empty_result() {
        let conn = memory_with("CREATE TABLE t (id INTEGER)");
        let err = conn
            .query_scalar::<i64>("SELECT id FROM t", &[])
            .unwrap_err();
        assert!(matches!(err, BackendError::Query(_)));
    }

    #[test]
    fn test_second_open_is_locked_until_close() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shop.db");

        let first = DbConnection::open_sqlite(&path).unwrap();
        assert_eq!(first.path(), Some(path.as_path()));
        assert!(matches!(
            DbConnection::open_sqlite(&path),
            Err(BackendError::Locked(_))
        ));

        first.close().unwrap();
        DbConnection::open_sqlite(&path).unwrap().close().unwrap();
    }

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
