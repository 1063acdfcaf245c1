//! HTTP binding for CloudEvents.
//!
//! Events travel over HTTP in one of two content modes:
//!
//! | Mode | Attributes | Body | Converter |
//! |------|------------|------|-----------|
//! | structured | inside the JSON document | the whole event | [`StructuredConverter`] |
//! | binary | one `Ce-*` header each | the event data | [`BinaryConverter`] |
//!
//! A [`RequestExtractor`] holds an ordered list of converters and hands a
//! request to the first one that claims its media type. The default registry
//! tries structured JSON first and falls back to binary for everything else.
//!
//! # Example
//!
//! ```rust
//! use binding::FromHttpRequest;
//! use event::v01;
//! use http::Request;
//!
//! let request = Request::builder()
//!     .header("Content-Type", "application/json")
//!     .header("Ce-Eventtype", "dispatch")
//!     .header("Ce-Source", "dispatch")
//!     .header("Ce-Eventid", "00001")
//!     .header("Ce-Eventtime", "2018-08-08T15:00:00-07:00")
//!     .header("Content-Length", "0")
//!     .body(std::io::empty())
//!     .unwrap();
//!
//! let event = v01::Event::from_http_request(Some(request)).unwrap();
//! assert_eq!(event.event_type, "dispatch");
//! assert!(event.data.is_none());
//! ```
//!
//! With the `axum` feature, `binding::axum::CloudEventRequest` extracts events
//! inside handlers and [`CodecError`] renders as a JSON error response.

mod binary;
mod config;
mod converter;
mod error;
mod extractor;
mod structured;
mod wire;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::binary::BinaryConverter;
pub use crate::config::{BindingConfig, ConfigError};
pub use crate::converter::HttpConverter;
pub use crate::error::CodecError;
pub use crate::extractor::{FromHttpRequest, RequestExtractor};
pub use crate::structured::StructuredConverter;
pub use crate::wire::{essence, media_type, STRUCTURED_JSON};
