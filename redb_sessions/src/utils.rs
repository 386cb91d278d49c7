use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Fill a buffer of `len` bytes from the system CSPRNG.
pub(crate) fn gen_random_bytes(len: usize) -> Result<Vec<u8>, UtilError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(bytes)
}

pub(crate) fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let bytes = gen_random_bytes(len)?;
    Ok(base64url_encode(&bytes))
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid format: {0}")]
    Format(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64url_roundtrip_without_padding() {
        let encoded = base64url_encode(&[0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
        assert_eq!(base64url_decode(&encoded).unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_base64url_decode_rejects_standard_alphabet() {
        let result = base64url_decode("+/8=");
        assert!(matches!(result, Err(UtilError::Format(_))));
    }

    #[test]
    fn test_gen_random_string_length_and_uniqueness() {
        // 32 bytes encode to 43 base64url characters without padding
        let first = gen_random_string(32).unwrap();
        let second = gen_random_string(32).unwrap();
        assert_eq!(first.len(), 43);
        assert_ne!(first, second);
    }
}
