mod errors;
mod secure;

pub use errors::CodecError;
pub use secure::{KeyPair, SecureCodec};

use crate::session::SessionValues;

/// Turns session values into an opaque, tamper-evident string and back.
///
/// `name` is the session (cookie) name and must be bound into the encoding,
/// so that a value produced for one name does not decode under another.
pub trait Codec: Send + Sync + 'static {
    fn encode(&self, name: &str, values: &SessionValues) -> Result<String, CodecError>;

    fn decode(&self, name: &str, value: &str) -> Result<SessionValues, CodecError>;
}

/// Encode with the first codec. The remaining codecs only serve decoding.
pub fn encode_multi(
    name: &str,
    values: &SessionValues,
    codecs: &[Box<dyn Codec>],
) -> Result<String, CodecError> {
    let codec = codecs.first().ok_or(CodecError::HashKeyNotSet)?;
    codec.encode(name, values)
}

/// Decode with each codec in turn and return the first success.
///
/// When no codec accepts the value, the error of the first (current) codec is
/// returned.
pub fn decode_multi(
    name: &str,
    value: &str,
    codecs: &[Box<dyn Codec>],
) -> Result<SessionValues, CodecError> {
    let mut first_error = None;
    for codec in codecs {
        match codec.decode(name, value) {
            Ok(values) => return Ok(values),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or(CodecError::HashKeyNotSet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec(hash: u8) -> Box<dyn Codec> {
        Box::new(SecureCodec::new(&KeyPair::new(vec![hash; 32])).unwrap())
    }

    fn values() -> SessionValues {
        let mut values = SessionValues::new();
        values.insert("foo".to_string(), json!("bar"));
        values
    }

    #[test]
    fn test_rotated_key_still_decodes() {
        // Given a value encoded under the old key
        let old = vec![codec(1)];
        let encoded = encode_multi("n", &values(), &old).unwrap();

        // When the new key is put in front of the old one
        let rotated = vec![codec(2), codec(1)];

        // Then the value still decodes
        assert_eq!(decode_multi("n", &encoded, &rotated).unwrap(), values());
    }

    #[test]
    fn test_encode_uses_first_codec() {
        let codecs = vec![codec(2), codec(1)];
        let encoded = encode_multi("n", &values(), &codecs).unwrap();

        assert!(decode_multi("n", &encoded, &[codec(2)]).is_ok());
        assert_eq!(
            decode_multi("n", &encoded, &[codec(1)]),
            Err(CodecError::Hmac)
        );
    }

    #[test]
    fn test_no_codecs() {
        assert_eq!(
            encode_multi("n", &values(), &[]),
            Err(CodecError::HashKeyNotSet)
        );
        assert_eq!(decode_multi("n", "x", &[]), Err(CodecError::HashKeyNotSet));
    }
}
