use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("Initializing bucket: {0}")]
    Bucket(String),

    #[error("Read transaction failed: {0}")]
    Read(String),

    #[error("Write transaction failed: {0}")]
    Write(String),

    #[error("Opening database: {0}")]
    Open(String),
}

impl From<redb::DatabaseError> for StorageError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Open(err.to_string())
    }
}

impl From<redb::CommitError> for StorageError {
    fn from(err: redb::CommitError) -> Self {
        Self::Write(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let error = StorageError::Read("table missing".to_string());
        assert_eq!(error.to_string(), "Read transaction failed: table missing");
    }

    #[test]
    fn test_error_is_sync_and_send() {
        fn assert_sync_send<T: Sync + Send>() {}
        assert_sync_send::<StorageError>();
    }
}
