//! redb_sessions - Server-side web sessions persisted in an embedded redb database
//!
//! A session is referenced by the client through a cookie carrying its identifier.
//! The values of the session live in a redb table ("bucket"), encoded by an
//! authenticated (and optionally encrypted) codec keyed by the cookie name.
//!
//! The store exposes the three lifecycle operations of a web session layer:
//! [`SessionStore::new_session`], [`SessionStore::get`] and [`SessionStore::save`],
//! plus [`SessionStore::delete`] / [`SessionStore::destroy`] for invalidation.

mod codec;
mod config;
mod errors;
mod id;
mod session;
mod storage;
mod utils;

pub use codec::{Codec, CodecError, KeyPair, SecureCodec, decode_multi, encode_multi};
pub use config::{
    DEFAULT_BUCKET_NAME, DEFAULT_CODEC_MAX_AGE, DEFAULT_MAX_AGE, DEFAULT_MAX_LENGTH, FLASH_KEY,
};
pub use errors::SessionError;
pub use id::{IdGenerator, RandomStringGenerator, UuidV4Generator};
pub use session::{
    SameSite, Session, SessionOptions, SessionStore, SessionStoreBuilder, SessionValues,
};
pub use storage::StorageError;
pub use utils::UtilError;

// Re-export redb Database for convenience
pub use redb::Database;
