//! CloudEvents event model
//!
//! This crate holds the in-memory side of the HTTP binding: the event types of
//! each supported schema version, their builders, and the static field tables
//! that tell the binding layer how every attribute travels in HTTP headers.
//!
//! ## What lives here
//!
//! - **[`CloudEvent`]** - the capability set every event version implements:
//!   version accessor, typed and generic attribute access, payload access.
//! - **[`v01::Event`] / [`v02::Event`]** - CloudEvents 0.1 and 0.2, each with a
//!   builder that refuses to produce an event without id, source and type.
//! - **[`FieldSpec`] / [`resolve`]** - compile-time descriptor tables and their
//!   resolution into `(wire name, required, kind)` triples.
//!
//! ## Example
//!
//! ```
//! use event::{v02, CloudEvent};
//!
//! let event = v02::Event::builder()
//!     .id("1234-1234-1234")
//!     .source("http://example.com/cloudevent")
//!     .event_type("com.example.cloudevent")
//!     .extension("myextension", "myvalue")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(event.spec_version(), "0.2");
//! assert_eq!(event.get("myextension"), Some(serde_json::json!("myvalue")));
//! ```
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

mod data;
mod error;
mod field;
pub mod v01;
pub mod v02;

pub use crate::data::{
    extension_from_header_values, extension_header_values, EventData, Extensions,
};
pub use crate::error::EventError;
pub use crate::field::{
    canonical_header_key, parse_timestamp, resolve, resolve_fields, FieldKind, FieldMetadata,
    FieldSpec, FieldValue, Timestamp, Wire,
};

/// Header prefix shared by every mapped attribute of the supported versions.
pub const DEFAULT_HEADER_PREFIX: &str = "CE-";

/// Logical name of the payload attribute.
pub const DATA_ATTRIBUTE: &str = "data";

/// Schema versions understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecVersion {
    V01,
    V02,
}

impl SpecVersion {
    /// Version string as written in events and headers.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V01 => "0.1",
            SpecVersion::V02 => "0.2",
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0.1" => Ok(SpecVersion::V01),
            "0.2" => Ok(SpecVersion::V02),
            other => Err(EventError::UnknownSpecVersion(other.to_string())),
        }
    }
}

/// Capability set shared by every event version.
///
/// Converters only ever talk to events through this trait: they create a
/// [`blank`](CloudEvent::blank) instance, walk [`FIELDS`](CloudEvent::FIELDS),
/// and assign typed values with [`set_field`](CloudEvent::set_field).
/// Callers get the looser [`get`](CloudEvent::get) / [`set`](CloudEvent::set)
/// pair over JSON values, where names that match no declared attribute fall
/// through to the extension map.
pub trait CloudEvent:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Schema version implemented by the type.
    const SPEC_VERSION: SpecVersion;

    /// Prefix used to derive header names for mapped attributes.
    const HEADER_PREFIX: &'static str = DEFAULT_HEADER_PREFIX;

    /// Descriptor table, in decode order.
    const FIELDS: &'static [FieldSpec];

    /// An empty event with only the spec version set.
    fn blank() -> Self;

    fn spec_version(&self) -> &str;

    fn id(&self) -> &str;

    fn source(&self) -> &str;

    fn event_type(&self) -> &str;

    /// Typed value of a declared attribute, `None` when unset.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Assigns a declared attribute.
    ///
    /// # Errors
    ///
    /// [`EventError::InvalidAttribute`] for unknown names or a value of the
    /// wrong shape, [`EventError::SpecVersionMismatch`] when the version
    /// attribute is given a different version.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), EventError>;

    fn data(&self) -> Option<&EventData>;

    fn set_data(&mut self, data: Option<EventData>);

    fn extensions(&self) -> &Extensions;

    fn extensions_mut(&mut self) -> &mut Extensions;

    /// Generic read by logical name.
    fn get(&self, name: &str) -> Option<Value> {
        if name == DATA_ATTRIBUTE {
            return self.data().map(EventData::to_value);
        }
        if Self::FIELDS.iter().any(|spec| spec.name == name) {
            return self.field(name).map(FieldValue::into_value);
        }
        self.extensions().get(name).cloned()
    }

    /// Generic write by logical name; unknown names become extensions.
    fn set(&mut self, name: &str, value: Value) -> Result<(), EventError> {
        if name == DATA_ATTRIBUTE {
            let data = (!value.is_null()).then_some(EventData::Json(value));
            self.set_data(data);
            return Ok(());
        }
        if let Some(spec) = Self::FIELDS.iter().find(|spec| spec.name == name) {
            let value = FieldValue::from_value(spec.kind, name, value)?;
            return self.set_field(name, value);
        }
        self.extensions_mut().insert(name.to_string(), value);
        Ok(())
    }

    /// Checks the invariants of a complete event.
    ///
    /// Required attributes must be non-empty, the version attribute must
    /// match [`SPEC_VERSION`](CloudEvent::SPEC_VERSION), and no extension may
    /// reuse the name of a declared attribute.
    fn validate(&self) -> Result<(), EventError> {
        if self.spec_version() != Self::SPEC_VERSION.as_str() {
            return Err(EventError::SpecVersionMismatch {
                expected: Self::SPEC_VERSION.to_string(),
                found: self.spec_version().to_string(),
            });
        }
        for spec in Self::FIELDS.iter().filter(|spec| spec.required) {
            match self.field(spec.name) {
                None => return Err(EventError::MissingRequiredAttribute(spec.name.to_string())),
                Some(FieldValue::Text(value)) if value.is_empty() => {
                    return Err(EventError::MissingRequiredAttribute(spec.name.to_string()))
                }
                Some(_) => {}
            }
        }
        check_extension_names(Self::FIELDS, self.extensions())
    }
}

/// Rejects extensions named like a declared attribute (ignoring case).
pub(crate) fn check_extension_names(
    fields: &[FieldSpec],
    extensions: &Extensions,
) -> Result<(), EventError> {
    match extensions
        .keys()
        .find(|key| fields.iter().any(|spec| spec.name.eq_ignore_ascii_case(key)))
    {
        Some(key) => Err(EventError::invalid(
            key,
            "extension name collides with a declared attribute",
        )),
        None => Ok(()),
    }
}

pub(crate) fn check_version(expected: SpecVersion, found: &str) -> Result<(), EventError> {
    if found == expected.as_str() {
        Ok(())
    } else {
        Err(EventError::SpecVersionMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}
