//! Authenticated, optionally encrypted encoding of session values
//!
//! An encoded value is the base64url form of `"<timestamp>|<payload>|<mac>"`,
//! where `payload` is the base64url serialized values (encrypted with AES-GCM
//! when a block key is configured) and `mac` is an HMAC-SHA256 over
//! `"<name>|<timestamp>|<payload>"`. Binding the name into the MAC and the
//! AEAD associated data keeps a value from being replayed under another name.

use std::fmt;

use chrono::Utc;
use hmac::{Hmac, Mac};
use ring::aead::{AES_128_GCM, AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use sha2::Sha256;

use super::Codec;
use super::errors::CodecError;
use crate::config::{DEFAULT_CODEC_MAX_AGE, DEFAULT_MAX_LENGTH};
use crate::session::SessionValues;
use crate::utils::{base64url_decode, base64url_encode, gen_random_bytes};

type HmacSha256 = Hmac<Sha256>;

/// Key material for one codec: an authentication key and an optional
/// encryption key (16 bytes for AES-128-GCM, 32 bytes for AES-256-GCM).
#[derive(Clone)]
pub struct KeyPair {
    hash_key: Vec<u8>,
    block_key: Option<Vec<u8>>,
}

impl KeyPair {
    pub fn new(hash_key: impl Into<Vec<u8>>) -> Self {
        Self {
            hash_key: hash_key.into(),
            block_key: None,
        }
    }

    pub fn with_block_key(mut self, block_key: impl Into<Vec<u8>>) -> Self {
        self.block_key = Some(block_key.into());
        self
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("hash_key", &format_args!("[{} bytes]", self.hash_key.len()))
            .field(
                "block_key",
                &self.block_key.as_ref().map(|k| format!("[{} bytes]", k.len())),
            )
            .finish()
    }
}

pub struct SecureCodec {
    hash_key: Vec<u8>,
    cipher: Option<LessSafeKey>,
    max_age: i64,
    max_length: usize,
}

impl SecureCodec {
    pub fn new(pair: &KeyPair) -> Result<Self, CodecError> {
        if pair.hash_key.is_empty() {
            return Err(CodecError::HashKeyNotSet);
        }

        let cipher = match &pair.block_key {
            Some(key) => {
                let algorithm = match key.len() {
                    16 => &AES_128_GCM,
                    32 => &AES_256_GCM,
                    len => return Err(CodecError::InvalidBlockKey(len)),
                };
                let unbound = UnboundKey::new(algorithm, key)
                    .map_err(|_| CodecError::InvalidBlockKey(key.len()))?;
                Some(LessSafeKey::new(unbound))
            }
            None => None,
        };

        Ok(Self {
            hash_key: pair.hash_key.clone(),
            cipher,
            max_age: DEFAULT_CODEC_MAX_AGE,
            max_length: DEFAULT_MAX_LENGTH,
        })
    }

    /// Reject values older than `seconds`. Zero disables the check.
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    /// Limit encoded values to `len` bytes. Zero disables the check.
    pub fn with_max_length(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    fn mac(&self, name: &str, timestamp: &str, payload: &str) -> Result<HmacSha256, CodecError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.hash_key).map_err(|_| CodecError::HashKeyNotSet)?;
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(timestamp.as_bytes());
        mac.update(b"|");
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    fn encrypt(key: &LessSafeKey, name: &str, plain: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let nonce_bytes = gen_random_bytes(NONCE_LEN).map_err(|_| CodecError::Encrypt)?;
        let nonce =
            Nonce::try_assume_unique_for_key(&nonce_bytes).map_err(|_| CodecError::Encrypt)?;

        let mut in_out = plain;
        key.seal_in_place_append_tag(nonce, Aad::from(name.as_bytes()), &mut in_out)
            .map_err(|_| CodecError::Encrypt)?;

        let mut sealed = nonce_bytes;
        sealed.extend_from_slice(&in_out);
        Ok(sealed)
    }

    fn decrypt(key: &LessSafeKey, name: &str, sealed: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        if sealed.len() < NONCE_LEN {
            return Err(CodecError::Decrypt);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CodecError::Decrypt)?;

        let mut in_out = ciphertext.to_vec();
        let plain = key
            .open_in_place(nonce, Aad::from(name.as_bytes()), &mut in_out)
            .map_err(|_| CodecError::Decrypt)?;
        Ok(plain.to_vec())
    }
}

impl fmt::Debug for SecureCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureCodec")
            .field("encrypted", &self.cipher.is_some())
            .field("max_age", &self.max_age)
            .field("max_length", &self.max_length)
            .finish()
    }
}

impl Codec for SecureCodec {
    fn encode(&self, name: &str, values: &SessionValues) -> Result<String, CodecError> {
        let plain = serde_json::to_vec(values).map_err(|e| CodecError::Serialize(e.to_string()))?;
        let data = match &self.cipher {
            Some(key) => Self::encrypt(key, name, plain)?,
            None => plain,
        };

        let timestamp = Utc::now().timestamp().to_string();
        let payload = base64url_encode(&data);
        let tag = self.mac(name, &timestamp, &payload)?.finalize().into_bytes();

        let encoded = base64url_encode(
            format!("{timestamp}|{payload}|{}", base64url_encode(&tag)).as_bytes(),
        );
        if self.max_length != 0 && encoded.len() > self.max_length {
            return Err(CodecError::ValueTooLong);
        }
        Ok(encoded)
    }

    fn decode(&self, name: &str, value: &str) -> Result<SessionValues, CodecError> {
        if self.max_length != 0 && value.len() > self.max_length {
            return Err(CodecError::ValueTooLong);
        }

        let inner = base64url_decode(value).map_err(|e| CodecError::Malformed(e.to_string()))?;
        let inner = String::from_utf8(inner)
            .map_err(|_| CodecError::Malformed("value is not valid UTF-8".to_string()))?;

        let mut parts = inner.splitn(3, '|');
        let (Some(timestamp), Some(payload), Some(tag)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CodecError::Malformed("expected three fields".to_string()));
        };

        let tag = base64url_decode(tag).map_err(|_| CodecError::Hmac)?;
        self.mac(name, timestamp, payload)?
            .verify_slice(&tag)
            .map_err(|_| CodecError::Hmac)?;

        let timestamp: i64 = timestamp
            .parse()
            .map_err(|_| CodecError::Malformed("invalid timestamp".to_string()))?;
        let oldest = Utc::now().timestamp().saturating_sub(self.max_age);
        if self.max_age != 0 && timestamp < oldest {
            return Err(CodecError::Expired);
        }

        let data = base64url_decode(payload).map_err(|e| CodecError::Malformed(e.to_string()))?;
        let plain = match &self.cipher {
            Some(key) => Self::decrypt(key, name, data)?,
            None => data,
        };

        serde_json::from_slice(&plain).map_err(|e| CodecError::Deserialize(e.to_string()))
    }
}
