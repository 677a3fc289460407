//! Store adapter: moves whole tables between the model and a SQLite file.
//!
//! A [`Store`] is either disconnected or connected to one database of a
//! [`Catalog`]. Saving rewrites the relation from scratch inside a single
//! transaction; loading reads the declared column types back into
//! [`ColumnType`]s.

use tracing::{debug, info, instrument, warn};

use tablewright_model::{convert, Column, ColumnType, Table, Value};

use crate::backend::{quote_ident, BackendError, DbConnection, DbRow, DbTransaction, DbValue};
use crate::catalog::{validate_name, Catalog};
use crate::error::{Result, StoreError};

enum StoreState {
    Disconnected,
    Connected {
        database: String,
        conn: DbConnection,
    },
}

/// Connection state for the current database.
pub struct Store {
    state: StoreState,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("database", &self.current_database())
            .finish()
    }
}

impl Store {
    /// A store with no open database.
    pub fn new() -> Self {
        Self {
            state: StoreState::Disconnected,
        }
    }

    /// Open database `name` from `catalog`, closing any open database first.
    #[instrument(skip(self, catalog))]
    pub fn connect(&mut self, catalog: &Catalog, name: &str) -> Result<()> {
        validate_name(name)?;
        if !catalog.exists(name) {
            return Err(StoreError::DatabaseNotFound(name.to_string()));
        }

        self.close()?;

        let conn = DbConnection::open_sqlite(&catalog.path_for(name)).map_err(|e| match e {
            BackendError::Locked(_) => StoreError::Locked(name.to_string()),
            other => StoreError::Backend(other),
        })?;
        info!("Connected to database '{}'", name);
        self.state = StoreState::Connected {
            database: name.to_string(),
            conn,
        };
        Ok(())
    }

    /// Close the open database, if any. Releases the file lock.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, StoreState::Disconnected) {
            StoreState::Disconnected => Ok(()),
            StoreState::Connected { database, conn } => {
                conn.close()?;
                info!("Closed database '{}'", database);
                Ok(())
            }
        }
    }

    /// Name of the open database.
    pub fn current_database(&self) -> Option<&str> {
        match &self.state {
            StoreState::Disconnected => None,
            StoreState::Connected { database, .. } => Some(database),
        }
    }

    fn connection(&self) -> Result<&DbConnection> {
        match &self.state {
            StoreState::Disconnected => Err(StoreError::NotConnected),
            StoreState::Connected { conn, .. } => Ok(conn),
        }
    }

    /// Write `table` to the relation of the same name, replacing its contents.
    ///
    /// A relation whose columns differ (by name or declared type) is dropped
    /// and recreated. Relation names ignore case, so a relation spelled
    /// differently in case only is refused with [`StoreError::NameClash`].
    /// Marks the table saved only after the commit.
    #[instrument(skip(self, table), fields(table = %table.name()))]
    pub fn save(&mut self, table: &mut Table) -> Result<()> {
        let conn = self.connection()?;
        let relation = table.name().to_string();
        if relation.trim().is_empty() {
            return Err(StoreError::invalid_name(relation, "table name is empty"));
        }
        if table.column_count() == 0 {
            return Err(StoreError::EmptySchema(relation));
        }

        let wanted: Vec<(String, String)> = table
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.ty.affinity().to_string()))
            .collect();
        let rows: Vec<Vec<DbValue>> = table
            .rows()
            .iter()
            .map(|row| row.values().iter().map(to_db_value).collect())
            .collect();

        conn.transaction(|tx| -> Result<()> {
            let found = tx.query_all(FIND_RELATION, &[DbValue::from(relation.as_str())])?;
            let stored = first_name(found)?;
            if let Some(existing) = stored.filter(|stored| *stored != relation) {
                return Err(StoreError::NameClash {
                    name: relation.clone(),
                    existing,
                });
            }

            let existing = declared_columns(tx, &relation)?;
            if !existing.is_empty() && !same_schema(&existing, &wanted) {
                warn!(
                    "Schema of '{}' changed, dropping and recreating relation",
                    relation
                );
                tx.execute_batch(&format!("DROP TABLE {}", quote_ident(&relation)))?;
            }

            let column_defs = wanted
                .iter()
                .map(|(name, affinity)| format!("{} {}", quote_ident(name), affinity))
                .collect::<Vec<_>>()
                .join(", ");
            tx.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                quote_ident(&relation),
                column_defs
            ))?;
            tx.execute(&format!("DELETE FROM {}", quote_ident(&relation)), &[])?;

            let names: Vec<&str> = wanted.iter().map(|(name, _)| name.as_str()).collect();
            let inserted = tx.insert_rows(&relation, &names, &rows)?;
            debug!("Inserted {} rows into '{}'", inserted, relation);
            Ok(())
        })?;

        table.mark_saved();
        info!("Saved table '{}' ({} rows)", relation, rows.len());
        Ok(())
    }

    /// Read relation `name` into a new, saved table.
    ///
    /// `name` matches regardless of case; the table takes the stored spelling.
    #[instrument(skip(self))]
    pub fn load(&self, name: &str) -> Result<Table> {
        let conn = self.connection()?;
        let stored = stored_relation(conn, name)?;
        let name = stored.as_str();

        let columns: Vec<Column> = conn
            .query_all(
                "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid",
                &[DbValue::from(name)],
            )?
            .into_iter()
            .map(|row| -> std::result::Result<Column, BackendError> {
                let column: String = row.get(0)?;
                let declared: Option<String> = row.get(1)?;
                let ty = ColumnType::from_affinity(declared.as_deref().unwrap_or(""));
                Ok(Column::new(column, ty))
            })
            .collect::<std::result::Result<_, BackendError>>()?;

        let select = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            columns
                .iter()
                .map(|c| quote_ident(&c.name))
                .collect::<Vec<_>>()
                .join(", "),
            quote_ident(name)
        );

        let mut rows = Vec::new();
        for (row_index, row) in conn.query_all(&select, &[])?.into_iter().enumerate() {
            let values = row
                .into_values()
                .into_iter()
                .zip(&columns)
                .map(|(stored, column)| {
                    from_db_value(stored, column.ty).map_err(|detail| StoreError::TypeConversion {
                        relation: name.to_string(),
                        column: column.name.clone(),
                        row: row_index,
                        detail,
                    })
                })
                .collect::<Result<Vec<Value>>>()?;
            rows.push(values);
        }

        let mut table = Table::from_parts(name, columns, rows)?;
        table.mark_saved();
        info!("Loaded table '{}' ({} rows)", name, table.row_count());
        Ok(table)
    }

    /// Replace `table` wholesale with relation `name`.
    ///
    /// On error `table` is left untouched.
    pub fn load_into(&self, table: &mut Table, name: &str) -> Result<()> {
        *table = self.load(name)?;
        Ok(())
    }

    /// Names of the user relations in the open database, sorted.
    pub fn list_relations(&self) -> Result<Vec<String>> {
        let conn = self.connection()?;
        let rows = conn.query_all(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
            &[],
        )?;
        let names = rows
            .iter()
            .map(|row| row.get::<String>(0))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Drop relation `name`. Callers confirm with the user first.
    #[instrument(skip(self))]
    pub fn delete_relation(&mut self, name: &str) -> Result<()> {
        let conn = self.connection()?;
        let stored = stored_relation(conn, name)?;
        conn.execute_batch(&format!("DROP TABLE {}", quote_ident(&stored)))?;
        info!("Deleted table '{}'", stored);
        Ok(())
    }
}

// SQLite resolves identifiers without regard to ASCII case.
const FIND_RELATION: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE";

fn first_name(rows: Vec<DbRow>) -> Result<Option<String>> {
    match rows.first() {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// Stored spelling of relation `name`.
fn stored_relation(conn: &DbConnection, name: &str) -> Result<String> {
    first_name(conn.query_all(FIND_RELATION, &[DbValue::from(name)])?)?
        .ok_or_else(|| StoreError::RelationNotFound(name.to_string()))
}

fn declared_columns(tx: &mut DbTransaction<'_>, relation: &str) -> Result<Vec<(String, String)>> {
    let rows = tx.query_all(
        "SELECT name, type FROM pragma_table_info(?1) ORDER BY cid",
        &[DbValue::from(relation)],
    )?;
    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.get(0)?;
        let declared: Option<String> = row.get(1)?;
        columns.push((name, declared.unwrap_or_default()));
    }
    Ok(columns)
}

fn same_schema(existing: &[(String, String)], wanted: &[(String, String)]) -> bool {
    existing.len() == wanted.len()
        && existing
            .iter()
            .zip(wanted)
            .all(|((en, et), (wn, wt))| en == wn && et.eq_ignore_ascii_case(wt))
}

fn to_db_value(value: &Value) -> DbValue {
    match value {
        Value::Null => DbValue::Null,
        Value::Integer(v) => DbValue::Integer(*v),
        Value::Float(v) => DbValue::Real(*v),
        Value::Text(v) => DbValue::Text(v.clone()),
        Value::Boolean(v) => DbValue::Boolean(*v),
    }
}

fn from_db_value(stored: DbValue, ty: ColumnType) -> std::result::Result<Value, String> {
    let value = match stored {
        DbValue::Null => return Ok(Value::Null),
        DbValue::Integer(v) => Value::Integer(v),
        DbValue::Real(v) => Value::Float(v),
        DbValue::Text(v) => Value::Text(v),
        DbValue::Boolean(v) => Value::Boolean(v),
        DbValue::Blob(bytes) => {
            return Err(format!("{}-byte blob cannot be read as {}", bytes.len(), ty))
        }
    };
    convert(&value, ty).ok_or_else(|| format!("stored value '{}' is not a valid {}", value, ty))
}
