//! The converter seam.
//!
//! A converter translates between one HTTP message shape and an event type.
//! Registries hold converters as `Box<dyn HttpConverter<E>>`, so the trait
//! stays object safe: bodies are passed as `&mut dyn Read` / `&mut dyn Write`.
use std::io::{Read, Write};

use event::CloudEvent;
use http::HeaderMap;

use crate::error::CodecError;

/// Reads and writes events of type `E` over HTTP.
///
/// Implementations hold no per-request state and may be shared across
/// threads. Media types handed to [`can_read`](HttpConverter::can_read) and
/// [`can_write`](HttpConverter::can_write) are bare and lower-cased.
pub trait HttpConverter<E: CloudEvent>: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this converter decodes requests declaring `media_type`.
    fn can_read(&self, media_type: &str) -> bool;

    /// Whether this converter encodes responses declaring `media_type`.
    fn can_write(&self, media_type: &str) -> bool;

    /// Media types this converter advertises. Catch-all converters advertise none.
    fn supported_media_types(&self) -> &[String];

    /// Decodes one event from a request's headers and body.
    fn read(&self, headers: &HeaderMap, body: &mut dyn Read) -> Result<E, CodecError>;

    /// Encodes `event` into `headers` and `body`.
    ///
    /// `content_type` is the full content type requested by the caller,
    /// parameters included.
    fn write(
        &self,
        event: &E,
        content_type: &str,
        headers: &mut HeaderMap,
        body: &mut dyn Write,
    ) -> Result<(), CodecError>;
}
