//! Event payload and extension values.
//!
//! The payload of an event is opaque to the binding layer. Binary mode hands
//! the raw request body over untouched, structured mode keeps whatever JSON
//! value sat under `data`. Both shapes live in [`EventData`].
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Open-ended extension attributes keyed by extension name.
pub type Extensions = HashMap<String, Value>;

/// Payload carried by an event.
///
/// In a JSON document binary data is written as a base64 string; reading a
/// JSON document always yields [`EventData::Json`].
///
/// ```rust
/// use event::EventData;
///
/// let raw = EventData::from(b"hello".to_vec());
/// assert_eq!(raw.as_bytes(), Some(&b"hello"[..]));
///
/// let json = EventData::from(serde_json::json!({"key": "value"}));
/// assert_eq!(json.to_vec().unwrap(), br#"{"key":"value"}"#.to_vec());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    /// Raw bytes, typically the body of a binary-mode request.
    Binary(Bytes),
    /// A decoded JSON value, typically from a structured-mode document.
    Json(Value),
}

impl EventData {
    /// Raw bytes when the payload is binary.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            EventData::Binary(bytes) => Some(bytes.as_ref()),
            EventData::Json(_) => None,
        }
    }

    /// JSON value when the payload is structured.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            EventData::Json(value) => Some(value),
            EventData::Binary(_) => None,
        }
    }

    /// Bytes to place on the wire as an HTTP body.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            EventData::Binary(bytes) => Ok(bytes.to_vec()),
            EventData::Json(value) => serde_json::to_vec(value),
        }
    }

    /// Generic view used by `CloudEvent::get`.
    pub(crate) fn to_value(&self) -> Value {
        match self {
            EventData::Binary(bytes) => Value::String(STANDARD.encode(bytes)),
            EventData::Json(value) => value.clone(),
        }
    }
}

impl Serialize for EventData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EventData::Binary(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            EventData::Json(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for EventData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(EventData::Json)
    }
}

impl From<Bytes> for EventData {
    fn from(value: Bytes) -> Self {
        EventData::Binary(value)
    }
}

impl From<Vec<u8>> for EventData {
    fn from(value: Vec<u8>) -> Self {
        EventData::Binary(Bytes::from(value))
    }
}

impl From<Value> for EventData {
    fn from(value: Value) -> Self {
        EventData::Json(value)
    }
}

/// Collapses the values of one extension header family member.
///
/// A single header value becomes a JSON string, repeated headers become an
/// array of strings.
pub fn extension_from_header_values(mut values: Vec<String>) -> Value {
    if values.len() == 1 {
        Value::String(values.remove(0))
    } else {
        Value::Array(values.into_iter().map(Value::String).collect())
    }
}

/// Splits an extension value back into header values.
///
/// Strings are written as-is and arrays emit one header per element. Any other
/// JSON value is written in its compact JSON form.
pub fn extension_header_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(extension_header_values).collect(),
        other => vec![other.to_string()],
    }
}
