//! The authenticated principal record.
//!
//! A [`Principal`] is an opaque key-value record produced by the
//! application's authenticate/subscribe hooks. Portico never mutates it;
//! the auth gate only attaches it to the request context and the render
//! locals. The single requirement is a stable `id` field usable as a
//! session key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An authenticated user's identity record.
///
/// # Example
///
/// ```
/// use portico_core::Principal;
///
/// let principal = Principal::new(42)
///     .with_field("email", "a@x.com")
///     .with_field("name", "Alice");
///
/// assert_eq!(principal.id_string().as_deref(), Some("42"));
/// assert_eq!(principal.get("email").unwrap(), "a@x.com");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Principal {
    fields: Map<String, Value>,
}

impl Principal {
    /// Creates a principal with the given stable identifier.
    #[must_use]
    pub fn new(id: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), id.into());
        Self { fields }
    }

    /// Creates a principal from a raw field map.
    ///
    /// The map should contain an `id` entry; principals without one
    /// cannot be bound to a session.
    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the stable identifier, if present.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.fields.get("id")
    }

    /// Returns the stable identifier rendered as a string.
    ///
    /// String identifiers are returned as-is; numeric and other scalar
    /// identifiers use their JSON rendering, so `42` becomes `"42"`.
    /// This is the form serialized into the session store.
    #[must_use]
    pub fn id_string(&self) -> Option<String> {
        match self.id()? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Returns an arbitrary field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the principal as a JSON value, for render locals.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_renders_as_string() {
        let principal = Principal::new(42);
        assert_eq!(principal.id_string().as_deref(), Some("42"));
    }

    #[test]
    fn test_string_id_unquoted() {
        let principal = Principal::new("user-7");
        assert_eq!(principal.id_string().as_deref(), Some("user-7"));
    }

    #[test]
    fn test_missing_id() {
        let principal = Principal::from_map(Map::new());
        assert!(principal.id().is_none());
        assert!(principal.id_string().is_none());
    }

    #[test]
    fn test_to_value_round_trip() {
        let principal = Principal::new(1).with_field("email", "a@x.com");
        let value = principal.to_value();
        assert_eq!(value["email"], "a@x.com");
        assert_eq!(value["id"], 1);
    }
}
