//! Storage Module
//!
//! The backend seam of the cache: three primitives (write, read one row,
//! delete) over a closed set of parameterized statements. Table and column
//! names come from a validated [`TableSchema`]; values only ever travel as
//! bound parameters.

mod memory;
mod sqlite;

use std::fmt::Debug;

use crate::cache::CacheEntry;
use crate::error::StorageError;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

// == Storage Backend ==
/// A store able to execute cache statements.
///
/// Implementations synchronise internally so a backend can be shared
/// between request handlers and the prune task.
pub trait StorageBackend: Send + Sync + Debug {
    /// Executes an `Insert` or `Upsert`, returning the number of rows written.
    fn execute_write(&self, statement: &Statement) -> Result<u64, StorageError>;

    /// Executes a `SelectByKey`, returning the matching row if any.
    fn execute_read_row(&self, statement: &Statement) -> Result<Option<CacheEntry>, StorageError>;

    /// Executes a `DeleteByKey` or `DeleteOlderThan`, returning rows removed.
    fn execute_delete(&self, statement: &Statement) -> Result<u64, StorageError>;

    /// Returns the number of stored rows.
    fn count(&self) -> Result<usize, StorageError>;
}

// == Statement ==
/// Parameterized statements understood by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Insert a new row; fails with `Duplicate` if the key exists
    Insert(CacheEntry),
    /// Insert a row, replacing any existing row with the same key
    Upsert(CacheEntry),
    /// Fetch the row with exactly this key
    SelectByKey { key: String },
    /// Remove the row with exactly this key
    DeleteByKey { key: String },
    /// Remove every row inserted strictly before `cutoff` (Unix seconds)
    DeleteOlderThan { cutoff: i64 },
}

/// Which primitive a statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Write,
    Read,
    Delete,
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Integer(i64),
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Insert(_) | Statement::Upsert(_) => StatementKind::Write,
            Statement::SelectByKey { .. } => StatementKind::Read,
            Statement::DeleteByKey { .. } | Statement::DeleteOlderThan { .. } => {
                StatementKind::Delete
            }
        }
    }

    /// The key this statement targets, if it targets a single key.
    pub fn key(&self) -> Option<&str> {
        match self {
            Statement::Insert(entry) | Statement::Upsert(entry) => Some(&entry.key),
            Statement::SelectByKey { key } | Statement::DeleteByKey { key } => Some(key),
            Statement::DeleteOlderThan { .. } => None,
        }
    }

    /// Fails unless this statement belongs to the `expected` primitive.
    pub fn expect_kind(&self, expected: StatementKind) -> Result<(), StorageError> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(self.mismatch(expected))
        }
    }

    /// Error for a statement handed to the wrong primitive.
    pub fn mismatch(&self, expected: StatementKind) -> StorageError {
        let msg = format!("{:?} statement passed to {:?} primitive", self.kind(), expected);
        match expected {
            StatementKind::Read => StorageError::Read(msg),
            StatementKind::Write | StatementKind::Delete => StorageError::Write(msg),
        }
    }

    /// Renders the SQL text with `?N` placeholders for `schema`.
    pub fn sql(&self, schema: &TableSchema) -> String {
        let table = schema.qualified_table();
        let (k, v, ts) = (&schema.key_column, &schema.value_column, &schema.ts_column);

        match self {
            Statement::Insert(_) => {
                format!("INSERT INTO {table} ({k}, {v}, {ts}) VALUES (?1, ?2, ?3)")
            }
            Statement::Upsert(_) => format!(
                "INSERT INTO {table} ({k}, {v}, {ts}) VALUES (?1, ?2, ?3) \
                 ON CONFLICT({k}) DO UPDATE SET {v} = excluded.{v}, {ts} = excluded.{ts}"
            ),
            Statement::SelectByKey { .. } => {
                format!("SELECT {k}, {v}, {ts} FROM {table} WHERE {k} = ?1")
            }
            Statement::DeleteByKey { .. } => format!("DELETE FROM {table} WHERE {k} = ?1"),
            Statement::DeleteOlderThan { .. } => format!("DELETE FROM {table} WHERE {ts} < ?1"),
        }
    }

    /// Parameters bound to the placeholders of [`Statement::sql`], in order.
    pub fn params(&self) -> Vec<Param> {
        match self {
            Statement::Insert(entry) | Statement::Upsert(entry) => vec![
                Param::Text(entry.key.clone()),
                Param::Text(entry.value.clone()),
                Param::Integer(entry.inserted_at),
            ],
            Statement::SelectByKey { key } | Statement::DeleteByKey { key } => {
                vec![Param::Text(key.clone())]
            }
            Statement::DeleteOlderThan { cutoff } => vec![Param::Integer(*cutoff)],
        }
    }
}

// == Table Schema ==
/// Table and column names used by SQL backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    prefix: String,
    table: String,
    key_column: String,
    value_column: String,
    ts_column: String,
}

impl TableSchema {
    /// Builds a schema, rejecting anything that is not a plain identifier.
    pub fn new(
        prefix: impl Into<String>,
        table: impl Into<String>,
        key_column: impl Into<String>,
        value_column: impl Into<String>,
        ts_column: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let schema = Self {
            prefix: prefix.into(),
            table: table.into(),
            key_column: key_column.into(),
            value_column: value_column.into(),
            ts_column: ts_column.into(),
        };

        if !schema.prefix.is_empty() && !is_identifier(&schema.prefix) {
            return Err(StorageError::InvalidSchema(format!(
                "table prefix '{}' is not a plain identifier",
                schema.prefix
            )));
        }
        for name in [
            &schema.table,
            &schema.key_column,
            &schema.value_column,
            &schema.ts_column,
        ] {
            if !is_identifier(name) {
                return Err(StorageError::InvalidSchema(format!(
                    "'{}' is not a plain identifier",
                    name
                )));
            }
        }

        let columns = [&schema.key_column, &schema.value_column, &schema.ts_column];
        if columns[0] == columns[1] || columns[0] == columns[2] || columns[1] == columns[2] {
            return Err(StorageError::InvalidSchema(
                "key, value and timestamp columns must be distinct".to_string(),
            ));
        }

        Ok(schema)
    }

    /// Table name with the prefix applied.
    pub fn qualified_table(&self) -> String {
        format!("{}{}", self.prefix, self.table)
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn ts_column(&self) -> &str {
        &self.ts_column
    }

    /// DDL creating the table and its timestamp index.
    pub fn create_table_sql(&self) -> String {
        let table = self.qualified_table();
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                 {k} TEXT PRIMARY KEY NOT NULL, \
                 {v} TEXT NOT NULL, \
                 {ts} INTEGER NOT NULL\
             );\n\
             CREATE INDEX IF NOT EXISTS {table}_{ts}_idx ON {table} ({ts});",
            k = self.key_column,
            v = self.value_column,
            ts = self.ts_column,
        )
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.qualified_table())
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            table: "hmac_cache".to_string(),
            key_column: "hmac".to_string(),
            value_column: "data".to_string(),
            ts_column: "ts".to_string(),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
