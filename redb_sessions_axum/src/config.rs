//! Environment configuration for the axum integration

use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use redb_sessions::{KeyPair, SessionError};

/// Name of the session cookie
/// Default: "session_id"
pub static SESSION_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session_id".to_string())
});

/// Path of the redb database file
/// Default: "sessions.redb"
pub static SESSION_DB_PATH: LazyLock<String> = LazyLock::new(|| {
    std::env::var("SESSION_DB_PATH").unwrap_or_else(|_| "sessions.redb".to_string())
});

/// Whether the session cookie carries the `Secure` attribute
pub static SESSION_COOKIE_SECURE: LazyLock<bool> = LazyLock::new(|| {
    parse_bool(std::env::var("SESSION_COOKIE_SECURE").ok().as_deref(), true)
});

/// Start a fresh session when the cookie references a session that is not
/// stored, instead of rejecting the request with 401.
pub static SESSION_REISSUE_ON_MISSING: LazyLock<bool> = LazyLock::new(|| {
    parse_bool(
        std::env::var("SESSION_REISSUE_ON_MISSING").ok().as_deref(),
        false,
    )
});

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "true" || v == "1" => true,
        Some(v) if v == "false" || v == "0" => false,
        _ => default,
    }
}

/// Parse `hash[:block],hash[:block],...` where every key is base64url
/// (unpadded). The first pair encodes, all pairs decode.
pub(crate) fn parse_key_pairs(value: &str) -> Result<Vec<KeyPair>, SessionError> {
    let decode = |key: &str| {
        URL_SAFE_NO_PAD
            .decode(key.trim())
            .map_err(|_| SessionError::Config("SESSION_KEYS holds an invalid key".to_string()))
    };

    let mut pairs = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let pair = match entry.split_once(':') {
            Some((hash, block)) => KeyPair::new(decode(hash)?).with_block_key(decode(block)?),
            None => KeyPair::new(decode(entry)?),
        };
        pairs.push(pair);
    }

    if pairs.is_empty() {
        return Err(SessionError::InsufficientKeys);
    }
    Ok(pairs)
}

/// Read the codec key pairs from `SESSION_KEYS`.
pub fn key_pairs_from_env() -> Result<Vec<KeyPair>, SessionError> {
    let value = std::env::var("SESSION_KEYS").map_err(|_| SessionError::InsufficientKeys)?;
    parse_key_pairs(&value)
}
