//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cache::CacheEntry;
use crate::error::StorageError;
use crate::storage::{Statement, StatementKind, StorageBackend};

// == Memory Backend ==
/// HashMap-backed storage. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, CacheEntry>>, StorageError> {
        self.rows
            .read()
            .map_err(|_| StorageError::Unavailable("memory backend lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, CacheEntry>>, StorageError> {
        self.rows
            .write()
            .map_err(|_| StorageError::Unavailable("memory backend lock poisoned".to_string()))
    }
}

impl StorageBackend for MemoryBackend {
    fn execute_write(&self, statement: &Statement) -> Result<u64, StorageError> {
        let mut rows = self.write()?;

        match statement {
            Statement::Insert(entry) => {
                if rows.contains_key(&entry.key) {
                    return Err(StorageError::Duplicate(entry.key.clone()));
                }
                rows.insert(entry.key.clone(), entry.clone());
            }
            Statement::Upsert(entry) => {
                rows.insert(entry.key.clone(), entry.clone());
            }
            other => return Err(other.mismatch(StatementKind::Write)),
        }
        Ok(1)
    }

    fn execute_read_row(&self, statement: &Statement) -> Result<Option<CacheEntry>, StorageError> {
        let rows = self.read()?;

        match statement {
            Statement::SelectByKey { key } => Ok(rows.get(key).cloned()),
            other => Err(other.mismatch(StatementKind::Read)),
        }
    }

    fn execute_delete(&self, statement: &Statement) -> Result<u64, StorageError> {
        let mut rows = self.write()?;

        match statement {
            Statement::DeleteByKey { key } => Ok(u64::from(rows.remove(key).is_some())),
            Statement::DeleteOlderThan { cutoff } => {
                let before = rows.len();
                rows.retain(|_, entry| entry.inserted_at >= *cutoff);
                Ok((before - rows.len()) as u64)
            }
            other => Err(other.mismatch(StatementKind::Delete)),
        }
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str, ts: i64) -> CacheEntry {
        CacheEntry::new(key, value, ts)
    }

    #[test]
    fn test_insert_then_select() {
        let backend = MemoryBackend::new();
        backend
            .execute_write(&Statement::Insert(entry("k", "v", 100)))
            .unwrap();

        let row = backend
            .execute_read_row(&Statement::SelectByKey { key: "k".into() })
            .unwrap()
            .unwrap();
        assert_eq!(row.value, "v");
        assert_eq!(row.inserted_at, 100);
    }

    #[test]
    fn test_insert_duplicate_fails() {
        let backend = MemoryBackend::new();
        backend
            .execute_write(&Statement::Insert(entry("k", "v1", 100)))
            .unwrap();

        let result = backend.execute_write(&Statement::Insert(entry("k", "v2", 101)));
        assert!(matches!(result, Err(StorageError::Duplicate(_))));
        assert_eq!(backend.count().unwrap(), 1);
    }

    #[test]
    fn test_upsert_replaces() {
        let backend = MemoryBackend::new();
        backend
            .execute_write(&Statement::Upsert(entry("k", "v1", 100)))
            .unwrap();
        backend
            .execute_write(&Statement::Upsert(entry("k", "v2", 200)))
            .unwrap();

        let row = backend
            .execute_read_row(&Statement::SelectByKey { key: "k".into() })
            .unwrap()
            .unwrap();
        assert_eq!(row.value, "v2");
        assert_eq!(row.inserted_at, 200);
        assert_eq!(backend.count().unwrap(), 1);
    }

    #[test]
    fn test_delete_by_key_counts_rows() {
        let backend = MemoryBackend::new();
        backend
            .execute_write(&Statement::Insert(entry("k", "v", 100)))
            .unwrap();

        let stmt = Statement::DeleteByKey { key: "k".into() };
        assert_eq!(backend.execute_delete(&stmt).unwrap(), 1);
        assert_eq!(backend.execute_delete(&stmt).unwrap(), 0);
    }

    #[test]
    fn test_delete_older_than_is_strict() {
        let backend = MemoryBackend::new();
        for (key, ts) in [("a", 90), ("b", 100), ("c", 110)] {
            backend
                .execute_write(&Statement::Insert(entry(key, key, ts)))
                .unwrap();
        }

        let removed = backend
            .execute_delete(&Statement::DeleteOlderThan { cutoff: 100 })
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(backend.count().unwrap(), 2);
        assert!(backend
            .execute_read_row(&Statement::SelectByKey { key: "b".into() })
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_wrong_primitive_is_rejected() {
        let backend = MemoryBackend::new();
        let result = backend.execute_write(&Statement::DeleteOlderThan { cutoff: 0 });
        assert!(matches!(result, Err(StorageError::Write(_))));

        let result = backend.execute_read_row(&Statement::DeleteByKey { key: "k".into() });
        assert!(matches!(result, Err(StorageError::Read(_))));
    }
}
