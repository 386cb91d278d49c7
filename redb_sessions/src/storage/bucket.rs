use std::sync::Arc;

use redb::{Database, TableDefinition, TableError};

use super::errors::StorageError;

type SessionTable<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

/// A named redb table holding encoded session values keyed by session id.
///
/// The database handle is shared; every operation runs in its own redb
/// transaction and relies on redb's single-writer / multi-reader isolation.
#[derive(Clone)]
pub(crate) struct SessionBucket {
    db: Arc<Database>,
    name: String,
}

impl SessionBucket {
    /// Bind to `name`, creating the table if it does not exist yet.
    pub(crate) fn open(db: Arc<Database>, name: &str) -> Result<Self, StorageError> {
        if name.is_empty() {
            return Err(StorageError::Bucket("bucket name is empty".to_string()));
        }

        let bucket = Self {
            db,
            name: name.to_string(),
        };

        let txn = bucket
            .db
            .begin_write()
            .map_err(|e| StorageError::Bucket(e.to_string()))?;
        {
            txn.open_table(bucket.definition())
                .map_err(|e| StorageError::Bucket(e.to_string()))?;
        }
        txn.commit()
            .map_err(|e| StorageError::Bucket(e.to_string()))?;

        tracing::debug!("Session bucket '{}' ready", bucket.name);
        Ok(bucket)
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> SessionTable<'_> {
        TableDefinition::new(&self.name)
    }

    pub(crate) fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Read(e.to_string()))?;
        let table = match txn.open_table(self.definition()) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => {
                return Err(StorageError::Read(format!(
                    "bucket '{}' does not exist",
                    self.name
                )));
            }
            Err(e) => return Err(StorageError::Read(e.to_string())),
        };

        let value = table
            .get(key)
            .map_err(|e| StorageError::Read(e.to_string()))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    /// Insert or replace the value at `key` and commit.
    pub(crate) fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        {
            let mut table = txn
                .open_table(self.definition())
                .map_err(|e| StorageError::Write(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StorageError::Write(e.to_string()))?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Remove `key` and commit. Returns whether a value was present.
    pub(crate) fn remove(&self, key: &[u8]) -> Result<bool, StorageError> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        let existed = {
            let mut table = txn
                .open_table(self.definition())
                .map_err(|e| StorageError::Write(e.to_string()))?;
            let removed = table
                .remove(key)
                .map_err(|e| StorageError::Write(e.to_string()))?;
            removed.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }
}

#[cfg(test)]
pub(crate) fn in_memory_database() -> Arc<Database> {
    Arc::new(
        Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .expect("in-memory database"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_bucket() {
        // Given an empty database
        let db = in_memory_database();

        // When binding a bucket
        let bucket = SessionBucket::open(db.clone(), "sessions").unwrap();

        // Then reads succeed against the new table
        assert_eq!(bucket.name(), "sessions");
        assert_eq!(bucket.get(b"missing").unwrap(), None);
    }

    #[test]
    fn test_open_is_idempotent_and_keeps_data() {
        let db = in_memory_database();
        let first = SessionBucket::open(db.clone(), "sessions").unwrap();
        first.put(b"id", b"payload").unwrap();

        let second = SessionBucket::open(db, "sessions").unwrap();
        assert_eq!(second.get(b"id").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let result = SessionBucket::open(in_memory_database(), "");
        assert!(matches!(result, Err(StorageError::Bucket(_))));
    }

    #[test]
    fn test_put_overwrites() {
        let bucket = SessionBucket::open(in_memory_database(), "sessions").unwrap();
        bucket.put(b"id", b"one").unwrap();
        bucket.put(b"id", b"two").unwrap();
        assert_eq!(bucket.get(b"id").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn test_remove() {
        let bucket = SessionBucket::open(in_memory_database(), "sessions").unwrap();
        bucket.put(b"id", b"one").unwrap();

        assert!(bucket.remove(b"id").unwrap());
        assert!(!bucket.remove(b"id").unwrap());
        assert_eq!(bucket.get(b"id").unwrap(), None);
    }

    #[test]
    fn test_buckets_are_separate() {
        let db = in_memory_database();
        let a = SessionBucket::open(db.clone(), "a").unwrap();
        let b = SessionBucket::open(db, "b").unwrap();
        a.put(b"id", b"one").unwrap();
        assert_eq!(b.get(b"id").unwrap(), None);
    }
}
