//! Error types produced by the event model.
//!
//! These errors cover construction and mutation of events: builders refusing
//! to produce an event without its identity attributes, generic `set` calls
//! receiving a value of the wrong shape, and descriptor tables that break the
//! one-extension-map rule.
//!
//! | Error | Raised by |
//! |-------|-----------|
//! | [`MissingRequiredAttribute`](EventError::MissingRequiredAttribute) | builders, [`CloudEvent::validate`](crate::CloudEvent::validate) |
//! | [`InvalidAttribute`](EventError::InvalidAttribute) | [`CloudEvent::set`](crate::CloudEvent::set), [`CloudEvent::set_field`](crate::CloudEvent::set_field) |
//! | [`InvalidDescriptor`](EventError::InvalidDescriptor) | [`resolve`](crate::resolve) |
//! | [`UnknownSpecVersion`](EventError::UnknownSpecVersion) | [`SpecVersion::from_str`](crate::SpecVersion) |
//! | [`SpecVersionMismatch`](EventError::SpecVersionMismatch) | builders, setters of the version attribute |
use thiserror::Error;

/// Errors raised while building, mutating or describing an event.
///
/// All variants are cloneable and comparable so tests and callers can match
/// on them precisely.
///
/// ```rust
/// use event::EventError;
///
/// let err = EventError::MissingRequiredAttribute("id".into());
/// assert_eq!(err.to_string(), "missing required attribute: id");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventError {
    /// One of the identity attributes (id, source, type) is absent or empty.
    #[error("missing required attribute: {0}")]
    MissingRequiredAttribute(String),

    /// A value could not be assigned to the named attribute.
    #[error("invalid value for attribute {name}: {reason}")]
    InvalidAttribute {
        /// Logical attribute name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The static field table of an event type is inconsistent.
    #[error("invalid field descriptor: {0}")]
    InvalidDescriptor(String),

    /// A version string that names no known schema version.
    #[error("unknown spec version: {0}")]
    UnknownSpecVersion(String),

    /// An event of one schema version was handed a different version string.
    #[error("spec version mismatch: expected {expected}, found {found}")]
    SpecVersionMismatch {
        /// Version fixed by the event type.
        expected: String,
        /// Version that was supplied.
        found: String,
    },
}

impl EventError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        EventError::InvalidAttribute {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
