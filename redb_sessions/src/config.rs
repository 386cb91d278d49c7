//! Default values shared by the session store and its codecs

/// Name of the redb table in which sessions are stored unless overridden.
pub const DEFAULT_BUCKET_NAME: &str = "_redb_sessions";

/// Default cookie `Max-Age` of new sessions: 30 days
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

/// Encoded values older than this many seconds are rejected by the codec.
/// Default: 30 days
pub const DEFAULT_CODEC_MAX_AGE: i64 = 86400 * 30;

/// Maximum length of an encoded value in bytes.
pub const DEFAULT_MAX_LENGTH: usize = 4096;

/// Reserved value key under which flash messages are kept.
pub const FLASH_KEY: &str = "_flash";
