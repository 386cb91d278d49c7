use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("hash key is not set")]
    HashKeyNotSet,

    #[error("invalid block key length {0}, expected 16 or 32 bytes")]
    InvalidBlockKey(usize),

    #[error("the value could not be serialized: {0}")]
    Serialize(String),

    #[error("the value could not be deserialized: {0}")]
    Deserialize(String),

    #[error("the value could not be encrypted")]
    Encrypt,

    #[error("the value could not be decrypted")]
    Decrypt,

    /// MAC verification failed: the value was tampered with or signed with another key
    #[error("the value could not be authenticated")]
    Hmac,

    #[error("the value is malformed: {0}")]
    Malformed(String),

    #[error("the value is too long")]
    ValueTooLong,

    #[error("the value has expired")]
    Expired,
}

impl CodecError {
    /// True for errors raised while reading a value back, as opposed to
    /// configuration or encoding failures.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Deserialize(_)
                | Self::Decrypt
                | Self::Hmac
                | Self::Malformed(_)
                | Self::ValueTooLong
                | Self::Expired
        )
    }
}
