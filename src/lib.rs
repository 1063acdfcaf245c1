//! CloudEvents over HTTP.
//!
//! This crate stitches the event model (`event`) and the HTTP binding
//! (`binding`) together behind two entry points:
//!
//! - [`from_http_request`] decodes a request into a statically chosen event
//!   type.
//! - [`from_http_request_any`] looks at the request first and decodes
//!   whichever schema version it declares.
//!
//! ```rust
//! use cloudevents::{AnyEvent, from_http_request_any};
//! use http::Request;
//!
//! let request = Request::builder()
//!     .header("Content-Type", "application/cloudevents+json")
//!     .body(&br#"{"cloudEventsVersion":"0.1","eventType":"t","source":"/s","eventID":"1"}"#[..])
//!     .unwrap();
//!
//! let event = from_http_request_any(Some(request)).unwrap();
//! assert!(matches!(event, AnyEvent::V01(_)));
//! assert_eq!(event.id(), "1");
//! ```
use std::io::Read;

use http::Request;
use thiserror::Error;

mod version;

pub use binding::{
    BinaryConverter, BindingConfig, CodecError, ConfigError, FromHttpRequest, HttpConverter,
    RequestExtractor, STRUCTURED_JSON, StructuredConverter,
};
#[cfg(feature = "axum")]
pub use binding::axum;
pub use event::{
    CloudEvent, EventData, EventError, Extensions, FieldKind, FieldMetadata, FieldSpec,
    FieldValue, SpecVersion, Timestamp, resolve, v01, v02,
};

pub use crate::version::{AnyEvent, DEFAULT_SPEC_VERSION, detect_version, from_http_request_any};

/// Errors surfaced by the top-level entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The request could not be decoded.
    #[error(transparent)]
    Binding(#[from] CodecError),

    /// An event attribute could not be read or assigned.
    #[error(transparent)]
    Event(#[from] EventError),

    /// The request declares a schema version this crate does not model.
    #[error("unsupported event type: spec version {0}")]
    UnsupportedType(String),
}

impl Error {
    /// Suggested HTTP status code for a response reporting this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Error::Binding(err) => err.http_status_code(),
            Error::Event(_) | Error::UnsupportedType(_) => 400,
        }
    }
}

/// Decodes `request` into `E` with the default converter registry.
///
/// Errors from the binding are passed through unchanged inside
/// [`Error::Binding`].
pub fn from_http_request<E, B>(request: Option<Request<B>>) -> Result<E, Error>
where
    E: CloudEvent,
    B: Read,
{
    Ok(E::from_http_request(request)?)
}
