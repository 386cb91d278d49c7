//! Session identifier generation
//!
//! A generator is asked for a fresh identifier every time a new session is
//! created. The request headers are handed over so that a generator can derive
//! request-scoped identifiers, the default ones ignore them.

use http::HeaderMap;

use crate::errors::SessionError;
use crate::utils::{gen_random_bytes, gen_random_string};

/// Produces unique session identifiers.
///
/// Implementations must return identifiers with negligible collision
/// probability and must fail rather than fall back to a predictable value.
/// Closures of the shape `Fn(&HeaderMap) -> Result<String, SessionError>` are
/// generators too.
pub trait IdGenerator: Send + Sync + 'static {
    fn generate(&self, request: &HeaderMap) -> Result<String, SessionError>;
}

impl<F> IdGenerator for F
where
    F: Fn(&HeaderMap) -> Result<String, SessionError> + Send + Sync + 'static,
{
    fn generate(&self, request: &HeaderMap) -> Result<String, SessionError> {
        self(request)
    }
}

/// Default generator: a random (version 4) UUID in its hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn generate(&self, _request: &HeaderMap) -> Result<String, SessionError> {
        let bytes: [u8; 16] = gen_random_bytes(16)?
            .try_into()
            .map_err(|_| SessionError::IdGeneration("short random read".to_string()))?;
        Ok(uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string())
    }
}

/// Random bytes rendered as unpadded base64url.
#[derive(Debug, Clone, Copy)]
pub struct RandomStringGenerator {
    len: usize,
}

impl RandomStringGenerator {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Default for RandomStringGenerator {
    fn default() -> Self {
        Self::new(32)
    }
}

impl IdGenerator for RandomStringGenerator {
    fn generate(&self, _request: &HeaderMap) -> Result<String, SessionError> {
        Ok(gen_random_string(self.len)?)
    }
}
