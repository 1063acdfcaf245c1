//! Error types produced by the HTTP binding.
//!
//! Every failure carries enough context (offending header, media type or
//! parser message) to diagnose a bad request without digging into the
//! converters. Malformed input is always terminal for the single operation
//! that saw it; nothing here is retried.
//!
//! | Error | Raised when | Status |
//! |-------|-------------|--------|
//! | [`NilRequest`](CodecError::NilRequest) | extraction got no request | 400 |
//! | [`ContentTypeParse`](CodecError::ContentTypeParse) | `Content-Type` missing or unparseable | 400 |
//! | [`ContentTypeNotSupported`](CodecError::ContentTypeNotSupported) | no converter claims the media type | 415 |
//! | [`MissingRequiredProperty`](CodecError::MissingRequiredProperty) | required attribute absent or empty | 400 |
//! | [`MalformedHeader`](CodecError::MalformedHeader) | header value cannot be decoded | 400 |
//! | [`MalformedBody`](CodecError::MalformedBody) | body unreadable or not a valid document | 400 |
//! | [`PayloadTooLarge`](CodecError::PayloadTooLarge) | body exceeds the configured limit | 413 |
//! | [`InvalidDescriptor`](CodecError::InvalidDescriptor) | event type's field table is inconsistent | 500 |
//! | [`Encode`](CodecError::Encode) | an event cannot be written out | 500 |
//!
//! ```rust
//! use binding::CodecError;
//!
//! let err = CodecError::ContentTypeNotSupported("text/plain".into());
//! assert_eq!(err.http_status_code(), 415);
//! assert_eq!(err.to_string(), "content type not supported: text/plain");
//! ```
use event::EventError;
use thiserror::Error;

/// Errors raised while reading or writing events over HTTP.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// Extraction was invoked without a request.
    #[error("cannot process nil request")]
    NilRequest,

    /// The declared content type is missing or not a valid media type.
    #[error("error parsing request content type: {0}")]
    ContentTypeParse(String),

    /// No registered converter claims the declared media type.
    #[error("content type not supported: {0}")]
    ContentTypeNotSupported(String),

    /// A required attribute was absent or empty.
    ///
    /// Binary mode names the header (`Ce-Eventid`), structured mode the JSON
    /// attribute (`eventID`).
    #[error("unable to parse event context: missing required property {0}")]
    MissingRequiredProperty(String),

    /// A header value could not be decoded for its attribute.
    #[error("error parsing the {field} header: {cause}")]
    MalformedHeader {
        /// Wire name of the offending header.
        field: String,
        /// Underlying parser message.
        cause: String,
    },

    /// The body could not be read or decoded.
    #[error("error parsing request body: {0}")]
    MalformedBody(String),

    /// The body is larger than the configured limit.
    #[error("request body exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The target event type publishes an inconsistent field table.
    #[error("invalid event descriptor: {0}")]
    InvalidDescriptor(String),

    /// An event could not be written to a response.
    #[error("error encoding event: {0}")]
    Encode(String),
}

impl CodecError {
    pub(crate) fn malformed_header(field: &str, cause: impl ToString) -> Self {
        CodecError::MalformedHeader {
            field: field.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Whether the failure is caused by the incoming request rather than by
    /// the local event type or the outbound writer.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            CodecError::InvalidDescriptor(_) | CodecError::Encode(_)
        )
    }

    /// Suggested HTTP status code for a response reporting this error.
    ///
    /// ```rust
    /// use binding::CodecError;
    ///
    /// assert_eq!(CodecError::NilRequest.http_status_code(), 400);
    /// assert_eq!(CodecError::PayloadTooLarge { limit: 16 }.http_status_code(), 413);
    /// assert_eq!(CodecError::Encode("io".into()).http_status_code(), 500);
    /// ```
    pub fn http_status_code(&self) -> u16 {
        match self {
            CodecError::ContentTypeNotSupported(_) => 415,
            CodecError::PayloadTooLarge { .. } => 413,
            CodecError::InvalidDescriptor(_) | CodecError::Encode(_) => 500,
            _ => 400,
        }
    }

    /// Stable machine-readable code, used in JSON error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            CodecError::NilRequest => "NIL_REQUEST",
            CodecError::ContentTypeParse(_) => "CONTENT_TYPE_PARSE",
            CodecError::ContentTypeNotSupported(_) => "CONTENT_TYPE_NOT_SUPPORTED",
            CodecError::MissingRequiredProperty(_) => "MISSING_REQUIRED_PROPERTY",
            CodecError::MalformedHeader { .. } => "MALFORMED_HEADER",
            CodecError::MalformedBody(_) => "MALFORMED_BODY",
            CodecError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            CodecError::InvalidDescriptor(_) => "INVALID_DESCRIPTOR",
            CodecError::Encode(_) => "ENCODE_ERROR",
        }
    }

    /// Maps an event validation failure found before encoding.
    pub(crate) fn from_write_validation(err: EventError) -> Self {
        match err {
            EventError::MissingRequiredAttribute(name) => CodecError::MissingRequiredProperty(name),
            other => CodecError::Encode(other.to_string()),
        }
    }

    /// Maps an event validation failure found while decoding.
    pub(crate) fn from_validation(err: EventError) -> Self {
        match err {
            EventError::MissingRequiredAttribute(name) => CodecError::MissingRequiredProperty(name),
            other => CodecError::MalformedBody(other.to_string()),
        }
    }
}
