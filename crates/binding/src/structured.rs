//! Structured content mode: the whole event is the JSON body.
use std::io::{Read, Write};

use event::CloudEvent;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};

use crate::converter::HttpConverter;
use crate::error::CodecError;
use crate::wire::{read_body, STRUCTURED_JSON};

/// Decodes and encodes events carried as a JSON document.
///
/// Request headers are ignored on read; every attribute comes from the body.
///
/// ```rust
/// use binding::{HttpConverter, StructuredConverter};
/// use event::v02;
///
/// let converter = StructuredConverter::new();
/// assert!(HttpConverter::<v02::Event>::can_read(&converter, "application/cloudevents+json"));
/// assert!(!HttpConverter::<v02::Event>::can_read(&converter, "application/json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredConverter {
    media_types: Vec<String>,
    max_body_bytes: Option<usize>,
}

impl StructuredConverter {
    /// Converter for `application/cloudevents+json` with no body limit.
    pub fn new() -> Self {
        Self::with_media_types([STRUCTURED_JSON])
    }

    /// Converter claiming exactly `media_types`, compared case-insensitively.
    pub fn with_media_types<I, S>(media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            media_types: media_types
                .into_iter()
                .map(|media_type| media_type.into().to_ascii_lowercase())
                .collect(),
            max_body_bytes: None,
        }
    }

    /// Caps the number of body bytes buffered on read.
    pub fn with_max_body_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_body_bytes = limit;
        self
    }

    fn claims(&self, media_type: &str) -> bool {
        self.media_types.iter().any(|m| m == media_type)
    }
}

impl Default for StructuredConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CloudEvent> HttpConverter<E> for StructuredConverter {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn can_read(&self, media_type: &str) -> bool {
        self.claims(media_type)
    }

    fn can_write(&self, media_type: &str) -> bool {
        self.claims(media_type)
    }

    fn supported_media_types(&self) -> &[String] {
        &self.media_types
    }

    fn read(&self, _headers: &HeaderMap, body: &mut dyn Read) -> Result<E, CodecError> {
        let bytes = read_body(body, self.max_body_bytes)?;
        let event: E = serde_json::from_slice(&bytes)
            .map_err(|err| CodecError::MalformedBody(err.to_string()))?;
        event.validate().map_err(CodecError::from_validation)?;
        Ok(event)
    }

    fn write(
        &self,
        event: &E,
        content_type: &str,
        headers: &mut HeaderMap,
        body: &mut dyn Write,
    ) -> Result<(), CodecError> {
        let value = HeaderValue::from_str(content_type)
            .map_err(|err| CodecError::Encode(err.to_string()))?;
        event.validate().map_err(CodecError::from_write_validation)?;
        headers.insert(CONTENT_TYPE, value);
        serde_json::to_writer(&mut *body, event).map_err(|err| CodecError::Encode(err.to_string()))
    }
}
