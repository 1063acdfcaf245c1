//! Static field descriptors and their resolution into wire metadata.
//!
//! Every event type publishes a table of [`FieldSpec`] entries through
//! [`CloudEvent::FIELDS`]. The table is the single source of truth for the
//! binary HTTP mapping: which attributes travel as headers, under which header
//! name, whether they must be present, and how their text is decoded.
//!
//! # Resolution
//!
//! ```text
//! FieldSpec { name: "eventID", wire: Derived, required, Plain }
//!        │  prefix "CE-" + name, canonical header case
//!        ▼
//! FieldMetadata { name: "eventID", wire_name: "Ce-Eventid", required, Plain }
//! ```
//!
//! Unmapped entries (the payload) never produce metadata. At most one entry
//! may be an extension map; its wire name is a prefix rather than a full
//! header name.
//!
//! ```rust
//! use event::{resolve, v01, FieldKind};
//!
//! let fields = resolve::<v01::Event>().unwrap();
//! let id = fields.iter().find(|f| f.name == "eventID").unwrap();
//! assert_eq!(id.wire_name, "Ce-Eventid");
//! assert!(id.required);
//! assert_eq!(id.kind, FieldKind::Plain);
//! ```
use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::data::Extensions;
use crate::error::EventError;
use crate::CloudEvent;

/// Timestamp representation used for time attributes.
///
/// The original UTC offset is kept so a decoded value re-encodes to the same
/// RFC 3339 text.
pub type Timestamp = DateTime<FixedOffset>;

/// Parses the single timestamp format accepted on the wire (RFC 3339).
pub fn parse_timestamp(value: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
}

/// Decoding rule applied to a mapped attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Copied verbatim as a string.
    Plain,
    /// RFC 3339 timestamp; an empty value leaves the attribute unset.
    Timestamp,
    /// Absorbs every header that starts with the field's wire name.
    ExtensionMap,
}

/// How an attribute is named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    /// Not part of the header mapping.
    Unmapped,
    /// Header name derived from the type's prefix and the attribute name.
    Derived,
    /// Explicit header name (or header prefix for extension maps).
    Named(&'static str),
}

/// One row of an event type's descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Logical attribute name, as used by `get`/`set` and in JSON.
    pub name: &'static str,
    pub wire: Wire,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// A string attribute mapped to a derived header name.
    pub const fn plain(name: &'static str) -> Self {
        Self {
            name,
            wire: Wire::Derived,
            required: false,
            kind: FieldKind::Plain,
        }
    }

    /// A timestamp attribute mapped to a derived header name.
    pub const fn timestamp(name: &'static str) -> Self {
        Self {
            name,
            wire: Wire::Derived,
            required: false,
            kind: FieldKind::Timestamp,
        }
    }

    /// The extension map, fed by every header starting with `prefix`.
    pub const fn extensions(name: &'static str, prefix: &'static str) -> Self {
        Self {
            name,
            wire: Wire::Named(prefix),
            required: false,
            kind: FieldKind::ExtensionMap,
        }
    }

    /// An attribute that is not carried in headers.
    pub const fn unmapped(name: &'static str) -> Self {
        Self {
            name,
            wire: Wire::Unmapped,
            required: false,
            kind: FieldKind::Plain,
        }
    }

    /// Marks the attribute as mandatory on decode.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Overrides the derived header name.
    pub const fn header(mut self, name: &'static str) -> Self {
        self.wire = Wire::Named(name);
        self
    }
}

/// Resolved wire mapping of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    pub name: &'static str,
    /// Canonical header name, or header prefix for [`FieldKind::ExtensionMap`].
    pub wire_name: String,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldMetadata {
    /// Whether `header` names this attribute (header names are case-insensitive).
    pub fn matches_header(&self, header: &str) -> bool {
        self.kind != FieldKind::ExtensionMap && self.wire_name.eq_ignore_ascii_case(header)
    }

    /// Extension name carried by `header`, if it belongs to this extension family.
    ///
    /// The prefix is stripped and the remainder canonicalised, so
    /// `ce-x-my-extension` under prefix `Ce-X-` yields `My-Extension`.
    pub fn extension_key(&self, header: &str) -> Option<String> {
        if self.kind != FieldKind::ExtensionMap || header.len() <= self.wire_name.len() {
            return None;
        }
        let (head, rest) = header.split_at_checked(self.wire_name.len())?;
        head.eq_ignore_ascii_case(&self.wire_name)
            .then(|| canonical_header_key(rest))
    }

    /// Header name used when writing extension `key`.
    pub fn extension_header(&self, key: &str) -> String {
        canonical_header_key(&format!("{}{}", self.wire_name, key))
    }
}

/// Resolves the descriptor table of `E` into wire metadata, in table order.
pub fn resolve<E: CloudEvent>() -> Result<Vec<FieldMetadata>, EventError> {
    resolve_fields(E::HEADER_PREFIX, E::FIELDS)
}

/// Resolves an explicit descriptor table against a header prefix.
///
/// # Errors
///
/// [`EventError::InvalidDescriptor`] when more than one extension map is
/// declared, or when an extension map has no explicit prefix.
pub fn resolve_fields(
    prefix: &str,
    fields: &[FieldSpec],
) -> Result<Vec<FieldMetadata>, EventError> {
    let mut resolved = Vec::with_capacity(fields.len());
    let mut extension_map: Option<&str> = None;

    for spec in fields {
        let wire_name = match spec.wire {
            Wire::Unmapped => continue,
            Wire::Derived => canonical_header_key(&format!("{prefix}{}", spec.name)),
            Wire::Named(name) => canonical_header_key(name),
        };

        if spec.kind == FieldKind::ExtensionMap {
            if !matches!(spec.wire, Wire::Named(_)) {
                return Err(EventError::InvalidDescriptor(format!(
                    "extension map {} needs an explicit header prefix",
                    spec.name
                )));
            }
            if let Some(existing) = extension_map {
                return Err(EventError::InvalidDescriptor(format!(
                    "extension maps {existing} and {} declared on one type",
                    spec.name
                )));
            }
            extension_map = Some(spec.name);
        }

        resolved.push(FieldMetadata {
            name: spec.name,
            wire_name,
            required: spec.required,
            kind: spec.kind,
        });
    }

    Ok(resolved)
}

/// Canonical MIME header form of `key`.
///
/// The first letter and every letter following a hyphen are upper-cased, all
/// other letters lower-cased. Keys containing a byte that is not a valid
/// header token character are returned unchanged.
///
/// ```rust
/// use event::canonical_header_key;
///
/// assert_eq!(canonical_header_key("CE-eventType"), "Ce-Eventtype");
/// assert_eq!(canonical_header_key("content-type"), "Content-Type");
/// assert_eq!(canonical_header_key("not a header"), "not a header");
/// ```
pub fn canonical_header_key(key: &str) -> String {
    if !key.bytes().all(is_token_byte) {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    let mut upper = true;
    for c in key.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Typed attribute value exchanged between converters and events.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Timestamp(Timestamp),
    Extensions(Extensions),
}

impl FieldValue {
    /// Generic JSON view of the value.
    pub fn into_value(self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s),
            FieldValue::Timestamp(t) => Value::String(t.to_rfc3339()),
            FieldValue::Extensions(map) => Value::Object(map.into_iter().collect()),
        }
    }

    /// Converts a generic JSON value into the shape `kind` expects.
    pub fn from_value(kind: FieldKind, name: &str, value: Value) -> Result<Self, EventError> {
        match (kind, value) {
            (FieldKind::Plain, Value::String(s)) => Ok(FieldValue::Text(s)),
            (FieldKind::Timestamp, Value::String(s)) => parse_timestamp(&s)
                .map(FieldValue::Timestamp)
                .map_err(|err| EventError::invalid(name, err.to_string())),
            (FieldKind::ExtensionMap, Value::Object(map)) => {
                Ok(FieldValue::Extensions(map.into_iter().collect()))
            }
            (FieldKind::Plain, other) | (FieldKind::Timestamp, other) => Err(EventError::invalid(
                name,
                format!("expected a string, got {other}"),
            )),
            (FieldKind::ExtensionMap, other) => Err(EventError::invalid(
                name,
                format!("expected an object, got {other}"),
            )),
        }
    }

    pub(crate) fn into_text(self, name: &str) -> Result<String, EventError> {
        match self {
            FieldValue::Text(s) => Ok(s),
            _ => Err(EventError::invalid(name, "expected a text value")),
        }
    }

    pub(crate) fn into_timestamp(self, name: &str) -> Result<Timestamp, EventError> {
        match self {
            FieldValue::Timestamp(t) => Ok(t),
            FieldValue::Text(s) => {
                parse_timestamp(&s).map_err(|err| EventError::invalid(name, err.to_string()))
            }
            FieldValue::Extensions(_) => Err(EventError::invalid(name, "expected a timestamp")),
        }
    }

    pub(crate) fn into_extensions(self, name: &str) -> Result<Extensions, EventError> {
        match self {
            FieldValue::Extensions(map) => Ok(map),
            _ => Err(EventError::invalid(name, "expected an extension map")),
        }
    }
}
