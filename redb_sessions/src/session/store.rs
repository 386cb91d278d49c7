use std::fmt;
use std::sync::Arc;

use http::header::{HeaderMap, SET_COOKIE};
use redb::Database;

use super::cookie::{session_id_from_headers, set_cookie_value};
use super::types::{Session, SessionOptions};
use crate::codec::{Codec, CodecError, KeyPair, SecureCodec, decode_multi, encode_multi};
use crate::config::{DEFAULT_BUCKET_NAME, DEFAULT_CODEC_MAX_AGE, DEFAULT_MAX_LENGTH};
use crate::errors::SessionError;
use crate::id::{IdGenerator, UuidV4Generator};
use crate::storage::SessionBucket;

/// Session store backed by a redb table.
///
/// Configuration is fixed at construction; all operations take `&self` and the
/// store can be shared between request handlers behind an `Arc`. Every
/// operation is a short blocking sequence of at most one redb transaction.
pub struct SessionStore {
    bucket: SessionBucket,
    codecs: Vec<Box<dyn Codec>>,
    id_generator: Box<dyn IdGenerator>,
    options: SessionOptions,
}

enum CodecSource {
    Pair(KeyPair),
    Custom(Box<dyn Codec>),
}

/// Builder for [`SessionStore`]. At least one key pair or codec is required.
///
/// ```no_run
/// use std::sync::Arc;
/// use redb_sessions::{Database, KeyPair, SessionStore};
///
/// let db = Arc::new(Database::create("sessions.redb")?);
/// let store = SessionStore::builder(db)
///     .key_pair(KeyPair::new(b"a-64-byte-authentication-key".to_vec()))
///     .bucket("sessions")
///     .build()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SessionStoreBuilder {
    db: Arc<Database>,
    codecs: Vec<CodecSource>,
    codec_max_age: i64,
    codec_max_length: usize,
    id_generator: Option<Box<dyn IdGenerator>>,
    bucket: Option<String>,
    options: Option<SessionOptions>,
}

impl SessionStoreBuilder {
    /// Add a key pair. The first configured pair encodes; all of them decode,
    /// in order, which allows rotating keys.
    pub fn key_pair(mut self, pair: KeyPair) -> Self {
        self.codecs.push(CodecSource::Pair(pair));
        self
    }

    pub fn key_pairs(mut self, pairs: impl IntoIterator<Item = KeyPair>) -> Self {
        self.codecs.extend(pairs.into_iter().map(CodecSource::Pair));
        self
    }

    /// Add a custom codec, ordered with the key pairs.
    pub fn codec(mut self, codec: impl Codec) -> Self {
        self.codecs.push(CodecSource::Custom(Box::new(codec)));
        self
    }

    /// Max age in seconds of values accepted by key-pair codecs. Zero disables
    /// it, a negative value is rejected by [`build`](Self::build).
    pub fn codec_max_age(mut self, seconds: i64) -> Self {
        self.codec_max_age = seconds;
        self
    }

    /// Max encoded length for key-pair codecs. Zero disables it.
    pub fn codec_max_length(mut self, len: usize) -> Self {
        self.codec_max_length = len;
        self
    }

    pub fn id_generator(mut self, generator: impl IdGenerator) -> Self {
        self.id_generator = Some(Box::new(generator));
        self
    }

    pub fn bucket(mut self, name: impl Into<String>) -> Self {
        self.bucket = Some(name.into());
        self
    }

    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Validate the configuration and create the bucket if needed.
    pub fn build(self) -> Result<SessionStore, SessionError> {
        if self.codecs.is_empty() {
            return Err(SessionError::InsufficientKeys);
        }
        if self.codec_max_age < 0 {
            return Err(SessionError::Config(format!(
                "codec max age must not be negative, got {}",
                self.codec_max_age
            )));
        }

        let codecs = self
            .codecs
            .into_iter()
            .map(|source| match source {
                CodecSource::Pair(pair) => SecureCodec::new(&pair)
                    .map(|codec| {
                        Box::new(
                            codec
                                .with_max_age(self.codec_max_age)
                                .with_max_length(self.codec_max_length),
                        ) as Box<dyn Codec>
                    })
                    .map_err(|e| SessionError::Config(e.to_string())),
                CodecSource::Custom(codec) => Ok(codec),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let bucket_name = self
            .bucket
            .unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string());
        let bucket = SessionBucket::open(self.db, &bucket_name)?;

        tracing::debug!(
            "Session store ready: bucket={}, codecs={}",
            bucket.name(),
            codecs.len()
        );

        Ok(SessionStore {
            bucket,
            codecs,
            id_generator: self
                .id_generator
                .unwrap_or_else(|| Box::new(UuidV4Generator)),
            options: self.options.unwrap_or_default(),
        })
    }
}

impl SessionStore {
    pub fn builder(db: Arc<Database>) -> SessionStoreBuilder {
        SessionStoreBuilder {
            db,
            codecs: Vec::new(),
            codec_max_age: DEFAULT_CODEC_MAX_AGE,
            codec_max_length: DEFAULT_MAX_LENGTH,
            id_generator: None,
            bucket: None,
            options: None,
        }
    }

    pub fn bucket_name(&self) -> &str {
        self.bucket.name()
    }

    /// Default options handed to new and loaded sessions
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Create a fresh, unsaved session. Storage is not touched.
    pub fn new_session(&self, request: &HeaderMap, name: &str) -> Result<Session, SessionError> {
        let id = self.id_generator.generate(request).map_err(|e| match e {
            SessionError::IdGeneration(_) => e,
            other => SessionError::IdGeneration(other.to_string()),
        })?;
        if id.is_empty() {
            return Err(SessionError::IdGeneration(
                "generator returned an empty id".to_string(),
            ));
        }

        tracing::trace!("New session for '{}'", name);
        Ok(Session::new(name, id, self.options.clone()))
    }

    /// Load the session referenced by cookie `name`.
    ///
    /// Without such a cookie a new session is returned. A cookie without a
    /// stored record yields [`SessionError::NotStored`]; a record that fails to
    /// decode yields [`SessionError::Decode`].
    #[tracing::instrument(skip(self, request))]
    pub fn get(&self, request: &HeaderMap, name: &str) -> Result<Session, SessionError> {
        let Some(id) = session_id_from_headers(request, name)? else {
            return self.new_session(request, name);
        };

        let raw = self
            .bucket
            .get(id.as_bytes())?
            .ok_or(SessionError::NotStored)?;
        let encoded = std::str::from_utf8(&raw).map_err(|_| {
            SessionError::Decode(CodecError::Malformed(
                "stored value is not valid UTF-8".to_string(),
            ))
        })?;
        let values = decode_multi(name, encoded, &self.codecs).map_err(SessionError::Decode)?;

        tracing::debug!("Loaded session with {} values", values.len());
        Ok(Session::restored(name, id, values, self.options.clone()))
    }

    /// Persist the session and append its cookie to `response`.
    ///
    /// The record is committed before the cookie is added; on any failure
    /// `response` is left untouched. A negative `max_age` destroys the session
    /// instead.
    #[tracing::instrument(skip_all, fields(name = session.name()))]
    pub fn save(
        &self,
        response: &mut HeaderMap,
        session: &mut Session,
    ) -> Result<(), SessionError> {
        if session.options.max_age < 0 {
            return self.destroy(response, session);
        }

        let encoded = encode_multi(session.name(), &session.values, &self.codecs)
            .map_err(SessionError::Encode)?;
        let cookie = set_cookie_value(session.name(), &session.id, &session.options)?;

        self.bucket.put(session.id.as_bytes(), encoded.as_bytes())?;
        session.is_new = false;
        response.append(SET_COOKIE, cookie);

        tracing::debug!("Saved session");
        Ok(())
    }

    /// Remove the stored record of session `id`. Returns whether one existed.
    pub fn delete(&self, id: &str) -> Result<bool, SessionError> {
        let existed = self.bucket.remove(id.as_bytes())?;
        tracing::debug!("Deleted session record (existed: {})", existed);
        Ok(existed)
    }

    /// Delete the stored record and append an expiring cookie to `response`.
    pub fn destroy(
        &self,
        response: &mut HeaderMap,
        session: &Session,
    ) -> Result<(), SessionError> {
        let options = SessionOptions {
            max_age: -1,
            ..session.options.clone()
        };
        let cookie = set_cookie_value(session.name(), "", &options)?;

        self.delete(&session.id)?;
        response.append(SET_COOKIE, cookie);
        Ok(())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("bucket", &self.bucket.name())
            .field("codecs", &self.codecs.len())
            .field("options", &self.options)
            .finish()
    }
}
