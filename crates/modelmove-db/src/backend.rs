//! Base database backend trait.
//!
//! The [`DatabaseBackend`] trait provides a uniform async interface for
//! executing SQL, querying, and running statement batches transactionally.
//! All methods are async; backends built on synchronous drivers (like
//! `rusqlite`) wrap operations in `spawn_blocking`.

use modelmove_core::{DatabaseSettings, ModelMoveError, ModelMoveResult};

use crate::row::Row;
use crate::sqlite::SqliteBackend;
use crate::value::Value;

/// The core trait for database backends.
#[async_trait::async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Returns the vendor name (e.g. "sqlite").
    fn vendor(&self) -> &str;

    /// Executes a SQL statement that does not return rows.
    ///
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> ModelMoveResult<u64>;

    /// Executes a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> ModelMoveResult<Vec<Row>>;

    /// Executes a SQL query and returns exactly one row.
    async fn query_one(&self, sql: &str, params: &[Value]) -> ModelMoveResult<Row> {
        let mut rows = self.query(sql, params).await?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(ModelMoveError::DatabaseError(
                "Query returned no rows when one was expected".into(),
            )),
            n => Err(ModelMoveError::DatabaseError(format!(
                "Query returned {n} rows when one was expected"
            ))),
        }
    }

    /// Executes a batch of statements inside a single transaction.
    ///
    /// Either all statements commit or none do.
    async fn execute_in_transaction(&self, statements: &[String]) -> ModelMoveResult<()>;

    /// Returns the names of all user tables, sorted.
    async fn list_tables(&self) -> ModelMoveResult<Vec<String>>;
}

/// Opens a backend for the given database settings.
///
/// SQLite is the only live backend; other engines fail with a configuration
/// error.
pub fn open_backend(settings: &DatabaseSettings) -> ModelMoveResult<Box<dyn DatabaseBackend>> {
    match settings.engine.as_str() {
        "sqlite" => Ok(Box::new(SqliteBackend::open(&settings.name)?)),
        other => Err(ModelMoveError::ConfigurationError(format!(
            "Unsupported database engine '{other}' (only 'sqlite' can be executed against)"
        ))),
    }
}
