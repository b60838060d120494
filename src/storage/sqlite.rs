//! SQLite storage backend.
//!
//! Every statement is prepared from [`Statement::sql`] and executed with its
//! parameters bound, so keys and values never reach the SQL text.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::ToSqlOutput;
use rusqlite::{params_from_iter, Connection, ErrorCode, OptionalExtension, ToSql};
use tracing::debug;

use crate::cache::CacheEntry;
use crate::error::StorageError;
use crate::storage::{Param, Statement, StatementKind, StorageBackend, TableSchema};

// == SQLite Backend ==
/// Storage on a single SQLite connection guarded by a mutex.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    schema: TableSchema,
}

impl SqliteBackend {
    /// Opens (or creates) the database file and ensures the table exists.
    pub fn open(path: impl AsRef<Path>, schema: TableSchema) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::from_connection(conn, schema)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory(schema: TableSchema) -> Result<Self, StorageError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::from_connection(conn, schema)
    }

    fn from_connection(conn: Connection, schema: TableSchema) -> Result<Self, StorageError> {
        conn.execute_batch(&schema.create_table_sql())
            .map_err(|e| StorageError::Write(e.to_string()))?;
        debug!("SQLite table {} ready", schema.qualified_table());

        Ok(Self {
            conn: Mutex::new(conn),
            schema,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("sqlite connection lock poisoned".to_string()))
    }

    fn execute(&self, statement: &Statement) -> Result<u64, StorageError> {
        let conn = self.connection()?;
        conn.execute(
            &statement.sql(&self.schema),
            params_from_iter(statement.params()),
        )
        .map(|rows| rows as u64)
        .map_err(|e| write_error(e, statement))
    }
}

impl StorageBackend for SqliteBackend {
    fn execute_write(&self, statement: &Statement) -> Result<u64, StorageError> {
        statement.expect_kind(StatementKind::Write)?;
        self.execute(statement)
    }

    fn execute_read_row(&self, statement: &Statement) -> Result<Option<CacheEntry>, StorageError> {
        statement.expect_kind(StatementKind::Read)?;
        let conn = self.connection()?;

        conn.query_row(
            &statement.sql(&self.schema),
            params_from_iter(statement.params()),
            |row| {
                Ok(CacheEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    inserted_at: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|e| StorageError::Read(e.to_string()))
    }

    fn execute_delete(&self, statement: &Statement) -> Result<u64, StorageError> {
        statement.expect_kind(StatementKind::Delete)?;
        self.execute(statement)
    }

    fn count(&self) -> Result<usize, StorageError> {
        let conn = self.connection()?;
        let count: i64 = conn
            .query_row(&self.schema.count_sql(), [], |row| row.get(0))
            .map_err(|e| StorageError::Read(e.to_string()))?;
        Ok(count.max(0) as usize)
    }
}

fn write_error(err: rusqlite::Error, statement: &Statement) -> StorageError {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::Duplicate(statement.key().unwrap_or_default().to_string())
        }
        other => StorageError::Write(other.to_string()),
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Param::Text(text) => Ok(ToSqlOutput::from(text.as_str())),
            Param::Integer(value) => Ok(ToSqlOutput::from(*value)),
        }
    }
}
