//! SQLite database backend using `rusqlite`.
//!
//! Provides the [`SqliteBackend`] which implements
//! [`DatabaseBackend`](crate::backend::DatabaseBackend) using `rusqlite`
//! wrapped in `tokio::task::spawn_blocking` for async compatibility.
//!
//! Features:
//! - In-memory database support via `:memory:` path
//! - Simple `Mutex`-based concurrency control

use std::path::PathBuf;
use std::sync::Arc;

use modelmove_core::{ModelMoveError, ModelMoveResult};
use tokio::sync::Mutex;

use crate::backend::DatabaseBackend;
use crate::row::Row;
use crate::value::Value;

/// A SQLite database backend.
///
/// Uses `rusqlite` for database access with a `Mutex`-based concurrency
/// model. All operations run via `tokio::task::spawn_blocking` to avoid
/// blocking the async runtime.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteBackend {
    /// Opens a new SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    pub fn open(path: impl Into<PathBuf>) -> ModelMoveResult<Self> {
        let path = path.into();
        let conn = if path.to_str() == Some(":memory:") {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| ModelMoveError::OperationalError(format!("SQLite open failed: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;").map_err(|e| {
            ModelMoveError::OperationalError(format!("Failed to set pragmas: {e}"))
        })?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database (convenience constructor).
    pub fn memory() -> ModelMoveResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Binds `Value` parameters to a `rusqlite` statement.
    fn bind_params(
        stmt: &mut rusqlite::Statement<'_>,
        params: &[Value],
    ) -> ModelMoveResult<()> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Uuid(u) => stmt.raw_bind_parameter(idx, u.to_string().as_str()),
                Value::Json(j) => stmt.raw_bind_parameter(idx, j.to_string().as_str()),
            }
            .map_err(|e| ModelMoveError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    /// Converts a `rusqlite` row to our generic `Row`.
    fn convert_row(
        sqlite_row: &rusqlite::Row<'_>,
        column_names: &[String],
    ) -> ModelMoveResult<Row> {
        let mut values = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            let value_ref = sqlite_row
                .get_ref(i)
                .map_err(|e| ModelMoveError::DatabaseError(format!("Row read error: {e}")))?;
            let value = match value_ref {
                rusqlite::types::ValueRef::Null => Value::Null,
                rusqlite::types::ValueRef::Integer(i) => Value::Int(i),
                rusqlite::types::ValueRef::Real(x) => Value::Float(x),
                rusqlite::types::ValueRef::Text(t) => {
                    Value::String(String::from_utf8_lossy(t).into_owned())
                }
                rusqlite::types::ValueRef::Blob(b) => {
                    Value::String(String::from_utf8_lossy(b).into_owned())
                }
            };
            values.push(value);
        }
        Ok(Row::new(column_names.to_vec(), values))
    }
}

#[async_trait::async_trait]
impl DatabaseBackend for SqliteBackend {
    fn vendor(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> ModelMoveResult<u64> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(|e| {
                ModelMoveError::DatabaseError(format!("Prepare failed: {e}: {sql}"))
            })?;
            Self::bind_params(&mut stmt, &params)?;
            let changed = stmt
                .raw_execute()
                .map_err(|e| ModelMoveError::DatabaseError(format!("Execute failed: {e}")))?;
            Ok(changed as u64)
        })
        .await
        .map_err(|e| ModelMoveError::OperationalError(format!("Task join error: {e}")))?
    }

    async fn query(&self, sql: &str, params: &[Value]) -> ModelMoveResult<Vec<Row>> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(|e| {
                ModelMoveError::DatabaseError(format!("Prepare failed: {e}: {sql}"))
            })?;
            let column_names: Vec<String> = stmt
                .column_names()
                .iter()
                .map(ToString::to_string)
                .collect();
            Self::bind_params(&mut stmt, &params)?;
            let mut rows = stmt.raw_query();
            let mut out = Vec::new();
            while let Some(row) = rows
                .next()
                .map_err(|e| ModelMoveError::DatabaseError(format!("Query failed: {e}")))?
            {
                out.push(Self::convert_row(row, &column_names)?);
            }
            Ok(out)
        })
        .await
        .map_err(|e| ModelMoveError::OperationalError(format!("Task join error: {e}")))?
    }

    async fn execute_in_transaction(&self, statements: &[String]) -> ModelMoveResult<()> {
        let conn = self.conn.clone();
        let statements = statements.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction().map_err(|e| {
                ModelMoveError::DatabaseError(format!("Cannot begin transaction: {e}"))
            })?;
            for sql in &statements {
                tx.execute_batch(sql).map_err(|e| {
                    ModelMoveError::DatabaseError(format!("Statement failed: {e}: {sql}"))
                })?;
            }
            tx.commit()
                .map_err(|e| ModelMoveError::DatabaseError(format!("Commit failed: {e}")))
        })
        .await
        .map_err(|e| ModelMoveError::OperationalError(format!("Task join error: {e}")))?
    }

    async fn list_tables(&self) -> ModelMoveResult<Vec<String>> {
        let rows = self
            .query(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                &[],
            )
            .await?;
        rows.iter().map(|row| row.get_string("name")).collect()
    }
}
