use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::CodecError;
use crate::config::{DEFAULT_MAX_AGE, FLASH_KEY};
use crate::errors::SessionError;

/// Application-visible payload of a session.
pub type SessionValues = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Attributes of the emitted session cookie.
///
/// `max_age` follows the usual cookie convention: positive values set
/// `Max-Age` and `Expires`, zero makes a browser-session cookie, and a
/// negative value deletes the cookie (and, on save, the stored session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub path: String,
    pub domain: Option<String>,
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            max_age: DEFAULT_MAX_AGE,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    /// Storage key and cookie value
    pub id: String,
    pub values: SessionValues,
    /// True until the session has been saved
    pub is_new: bool,
    pub options: SessionOptions,
    name: String,
}

impl Session {
    pub(crate) fn new(name: &str, id: String, options: SessionOptions) -> Self {
        Self {
            id,
            values: SessionValues::new(),
            is_new: true,
            options,
            name: name.to_string(),
        }
    }

    pub(crate) fn restored(
        name: &str,
        id: String,
        values: SessionValues,
        options: SessionOptions,
    ) -> Self {
        Self {
            id,
            values,
            is_new: false,
            options,
            name: name.to_string(),
        }
    }

    /// Cookie name the session was created or loaded under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<Option<serde_json::Value>, SessionError> {
        let value = serde_json::to_value(value)
            .map_err(|e| SessionError::Encode(CodecError::Serialize(e.to_string())))?;
        Ok(self.values.insert(key.into(), value))
    }

    /// Typed read of a value. `None` when absent or of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    /// Queue a flash message, read back once with [`Session::flashes`].
    pub fn add_flash<T: Serialize>(&mut self, message: T) -> Result<(), SessionError> {
        let message = serde_json::to_value(message)
            .map_err(|e| SessionError::Encode(CodecError::Serialize(e.to_string())))?;
        match self.values.get_mut(FLASH_KEY) {
            Some(serde_json::Value::Array(queue)) => queue.push(message),
            _ => {
                self.values
                    .insert(FLASH_KEY.to_string(), serde_json::Value::Array(vec![message]));
            }
        }
        Ok(())
    }

    /// Take all queued flash messages. They are gone from the session afterwards.
    pub fn flashes(&mut self) -> Vec<serde_json::Value> {
        match self.values.remove(FLASH_KEY) {
            Some(serde_json::Value::Array(queue)) => queue,
            Some(other) => vec![other],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn session() -> Session {
        Session::new("sess", "id-1".to_string(), SessionOptions::default())
    }

    #[test]
    fn test_default_options() {
        let options = SessionOptions::default();
        assert_eq!(options.path, "/");
        assert_eq!(options.max_age, 86400 * 30);
        assert!(options.domain.is_none());
    }

    #[test]
    fn test_new_and_restored_flags() {
        assert!(session().is_new);
        let restored = Session::restored(
            "sess",
            "id-1".to_string(),
            SessionValues::new(),
            SessionOptions::default(),
        );
        assert!(!restored.is_new);
        assert_eq!(restored.name(), "sess");
    }

    #[test]
    fn test_typed_insert_and_get() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Cart {
            items: Vec<String>,
        }

        let mut session = session();
        let cart = Cart {
            items: vec!["apple".to_string()],
        };
        assert_eq!(session.insert("cart", &cart).unwrap(), None);
        assert_eq!(session.get::<Cart>("cart"), Some(cart));

        // A value of another shape reads as None
        assert_eq!(session.get::<u64>("cart"), None);
        assert_eq!(session.get::<u64>("missing"), None);
    }

    #[test]
    fn test_insert_returns_previous_value() {
        let mut session = session();
        session.insert("count", 1).unwrap();
        assert_eq!(session.insert("count", 2).unwrap(), Some(json!(1)));
        assert_eq!(session.remove("count"), Some(json!(2)));
    }

    #[test]
    fn test_flashes_are_read_once() {
        // Given two queued flashes
        let mut session = session();
        session.add_flash("saved").unwrap();
        session.add_flash("again").unwrap();

        // When reading them
        let flashes = session.flashes();

        // Then both are returned in order and the queue is emptied
        assert_eq!(flashes, vec![json!("saved"), json!("again")]);
        assert!(session.flashes().is_empty());
        assert!(!session.values.contains_key(FLASH_KEY));
    }

    #[test]
    fn test_same_site_strings() {
        assert_eq!(SameSite::Strict.as_str(), "Strict");
        assert_eq!(SameSite::Lax.as_str(), "Lax");
        assert_eq!(SameSite::None.as_str(), "None");
    }
}
