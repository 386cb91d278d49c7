use thiserror::Error;

use crate::codec::CodecError;
use crate::storage::StorageError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// No codec was configured on the store
    #[error("No keys or key pairs were given")]
    InsufficientKeys,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generating session id: {0}")]
    IdGeneration(String),

    /// The session cookie is present but unreadable (not a missing cookie)
    #[error("Retrieving session cookie: {0}")]
    Cookie(String),

    /// A session cookie was sent, but no record exists for its identifier
    #[error("Session not found in store")]
    NotStored,

    #[error("Encoding session: {0}")]
    Encode(CodecError),

    #[error("Decoding session: {0}")]
    Decode(CodecError),

    /// Error from the storage backend
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_stored_display() {
        let error = SessionError::NotStored;
        assert_eq!(error.to_string(), "Session not found in store");
    }

    #[test]
    fn test_decode_wraps_codec_error() {
        // Given a codec error
        let error = SessionError::Decode(CodecError::Hmac);

        // Then the stage label is kept in the message
        assert_eq!(
            error.to_string(),
            "Decoding session: the value could not be authenticated"
        );
    }

    #[test]
    fn test_from_storage_error() {
        let error: SessionError = StorageError::Write("disk full".to_string()).into();
        match error {
            SessionError::Storage(StorageError::Write(msg)) => assert_eq!(msg, "disk full"),
            other => panic!("Expected SessionError::Storage, got: {other:?}"),
        }
    }

    #[test]
    fn test_error_is_sync_and_send() {
        fn assert_sync_send<T: Sync + Send>() {}
        assert_sync_send::<SessionError>();
    }
}
