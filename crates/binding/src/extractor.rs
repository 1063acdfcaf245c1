//! Converter registry and request extraction.
//!
//! ```text
//! Request ──► Content-Type ──► media type ──► first converter whose
//!   │          (missing/bad:     (params        can_read() is true
//!   │           ContentTypeParse) stripped)          │
//!   │                                                ▼
//!   └────────────── headers + body ──────────► converter.read()
//!                                                    │
//!                                      no match: ContentTypeNotSupported
//! ```
//!
//! Registration order is the dispatch policy: the first converter that claims
//! a media type handles it, and its result (success or failure) is final.
use std::fmt;
use std::io::{Read, Write};
use std::time::Instant;

use event::CloudEvent;
use http::{HeaderMap, Request, Response};
use tracing::{debug, info, warn, Level};

use crate::binary::BinaryConverter;
use crate::config::{BindingConfig, ConfigError};
use crate::converter::HttpConverter;
use crate::error::CodecError;
use crate::structured::StructuredConverter;
use crate::wire::{essence, media_type};

/// Ordered set of converters for event type `E`.
///
/// ```rust
/// use binding::RequestExtractor;
/// use event::v01;
/// use http::Request;
///
/// let request = Request::builder()
///     .header("Content-Type", "text/plain")
///     .header("Ce-Eventtype", "dispatch")
///     .header("Ce-Source", "dispatch")
///     .header("Ce-Eventid", "00001")
///     .body(&b"hello"[..])
///     .unwrap();
///
/// let event: v01::Event = RequestExtractor::default().extract(Some(request)).unwrap();
/// assert_eq!(event.event_id, "00001");
/// ```
pub struct RequestExtractor<E: CloudEvent> {
    converters: Vec<Box<dyn HttpConverter<E>>>,
}

impl<E: CloudEvent> RequestExtractor<E> {
    /// Registry consulted in exactly the given order.
    pub fn new(converters: Vec<Box<dyn HttpConverter<E>>>) -> Self {
        Self { converters }
    }

    /// Structured converter first, then the binary fallback when enabled.
    pub fn from_config(cfg: &BindingConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut converters: Vec<Box<dyn HttpConverter<E>>> = vec![Box::new(
            StructuredConverter::with_media_types(cfg.structured_media_types.iter().cloned())
                .with_max_body_bytes(cfg.max_body_bytes),
        )];
        if cfg.binary_fallback {
            converters.push(Box::new(
                BinaryConverter::new().with_max_body_bytes(cfg.max_body_bytes),
            ));
        }
        Ok(Self::new(converters))
    }

    /// Names of the registered converters, in dispatch order.
    pub fn converter_names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    /// Media types advertised by the registered converters, without duplicates.
    pub fn media_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for converter in &self.converters {
            for media_type in converter.supported_media_types() {
                if !types.contains(media_type) {
                    types.push(media_type.clone());
                }
            }
        }
        types
    }

    /// Decodes an event from `request`.
    ///
    /// `None` stands for an absent request and fails with
    /// [`CodecError::NilRequest`].
    pub fn extract<B: Read>(&self, request: Option<Request<B>>) -> Result<E, CodecError> {
        let request = request.ok_or(CodecError::NilRequest)?;
        let (parts, mut body) = request.into_parts();
        self.extract_parts(&parts.headers, &mut body)
    }

    /// Decodes an event from already separated headers and body.
    pub fn extract_parts(&self, headers: &HeaderMap, body: &mut dyn Read) -> Result<E, CodecError> {
        let start = Instant::now();
        let span = tracing::span!(
            Level::INFO,
            "binding.extract",
            spec_version = %E::SPEC_VERSION
        );
        let _guard = span.enter();

        match self.extract_inner(headers, body) {
            Ok((converter, event)) => {
                let elapsed_micros = start.elapsed().as_micros();
                info!(
                    converter,
                    event_id = %event.id(),
                    event_type = %event.event_type(),
                    elapsed_micros,
                    "extract_success"
                );
                Ok(event)
            }
            Err(err) => {
                let elapsed_micros = start.elapsed().as_micros();
                warn!(error = %err, elapsed_micros, "extract_failure");
                Err(err)
            }
        }
    }

    fn extract_inner(
        &self,
        headers: &HeaderMap,
        body: &mut dyn Read,
    ) -> Result<(&'static str, E), CodecError> {
        let media_type = media_type(headers)?;
        let converter = self
            .converters
            .iter()
            .find(|c| c.can_read(&media_type))
            .ok_or_else(|| CodecError::ContentTypeNotSupported(media_type.clone()))?;
        debug!(media_type = %media_type, converter = converter.name(), "converter_selected");
        let event = converter.read(headers, body)?;
        Ok((converter.name(), event))
    }

    /// First converter able to write `media_type` (bare, lower-cased).
    pub fn writer_for(&self, media_type: &str) -> Option<&dyn HttpConverter<E>> {
        self.converters
            .iter()
            .find(|c| c.can_write(media_type))
            .map(|c| c.as_ref())
    }

    /// Encodes `event` for a response declaring `content_type`.
    pub fn encode(
        &self,
        event: &E,
        content_type: &str,
        headers: &mut HeaderMap,
        body: &mut dyn Write,
    ) -> Result<(), CodecError> {
        let media_type = essence(content_type)?;
        let converter = self
            .writer_for(&media_type)
            .ok_or(CodecError::ContentTypeNotSupported(media_type))?;
        converter.write(event, content_type, headers, body)?;
        debug!(
            converter = converter.name(),
            event_id = %event.id(),
            "encode_success"
        );
        Ok(())
    }

    /// Encodes `event` into a complete response with a buffered body.
    pub fn to_response(&self, event: &E, content_type: &str) -> Result<Response<Vec<u8>>, CodecError> {
        let mut headers = HeaderMap::new();
        let mut body = Vec::new();
        self.encode(event, content_type, &mut headers, &mut body)?;
        let mut response = Response::new(body);
        *response.headers_mut() = headers;
        Ok(response)
    }
}

impl<E: CloudEvent> Default for RequestExtractor<E> {
    fn default() -> Self {
        Self::new(vec![
            Box::new(StructuredConverter::new()),
            Box::new(BinaryConverter::new()),
        ])
    }
}

impl<E: CloudEvent> fmt::Debug for RequestExtractor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExtractor")
            .field("converters", &self.converter_names())
            .finish()
    }
}

/// Decoding entry point available on every event type.
///
/// Each call assembles the default registry: structured JSON first, binary
/// as the fallback.
pub trait FromHttpRequest: CloudEvent {
    fn from_http_request<B: Read>(request: Option<Request<B>>) -> Result<Self, CodecError> {
        RequestExtractor::<Self>::default().extract(request)
    }
}

impl<E: CloudEvent> FromHttpRequest for E {}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use event::{v01, v02};
    use http::header::CONTENT_TYPE;

    use super::*;
    use crate::wire::STRUCTURED_JSON;

    /// Claims every media type and records how often it was consulted.
    struct Recording {
        name: &'static str,
        reads: Arc<AtomicUsize>,
        outcome: Result<(), CodecError>,
    }

    impl HttpConverter<v01::Event> for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn can_read(&self, _media_type: &str) -> bool {
            true
        }

        fn can_write(&self, _media_type: &str) -> bool {
            false
        }

        fn supported_media_types(&self) -> &[String] {
            &[]
        }

        fn read(&self, _headers: &HeaderMap, _body: &mut dyn Read) -> Result<v01::Event, CodecError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map(|()| v01::Event::blank())
        }

        fn write(
            &self,
            _event: &v01::Event,
            _content_type: &str,
            _headers: &mut HeaderMap,
            _body: &mut dyn Write,
        ) -> Result<(), CodecError> {
            unreachable!("never selected for writing")
        }
    }

    fn request(content_type: &str, body: &'static [u8]) -> Request<&'static [u8]> {
        Request::builder()
            .header(CONTENT_TYPE, content_type)
            .header("Ce-Eventtype", "dispatch")
            .header("Ce-Source", "dispatch")
            .header("Ce-Eventid", "00001")
            .body(body)
            .unwrap()
    }

    #[test]
    fn nil_request() {
        let extractor = RequestExtractor::<v01::Event>::default();
        assert_eq!(
            extractor.extract(None::<Request<&[u8]>>),
            Err(CodecError::NilRequest)
        );
    }

    #[test]
    fn missing_content_type() {
        let request = Request::builder().body(&b""[..]).unwrap();
        let result = RequestExtractor::<v01::Event>::default().extract(Some(request));
        assert!(matches!(result, Err(CodecError::ContentTypeParse(_))));
    }

    #[test]
    fn routes_structured_media_type_to_structured() {
        let body = br#"{"eventType":"json","source":"/s","eventID":"7","cloudEventsVersion":"0.1"}"#;
        let request = request("application/cloudevents+json; charset=utf-8", body);
        let event = RequestExtractor::<v01::Event>::default()
            .extract(Some(request))
            .unwrap();
        // Ce-* headers are ignored in structured mode.
        assert_eq!(event.event_type, "json");
        assert_eq!(event.event_id, "7");
    }

    #[test]
    fn falls_back_to_binary() {
        let event = RequestExtractor::<v01::Event>::default()
            .extract(Some(request("text/plain", b"hi")))
            .unwrap();
        assert_eq!(event.event_type, "dispatch");
        assert_eq!(event.data.as_ref().and_then(|d| d.as_bytes()), Some(&b"hi"[..]));
    }

    #[test]
    fn structured_only_rejects_other_types() {
        let extractor =
            RequestExtractor::<v01::Event>::new(vec![Box::new(StructuredConverter::new())]);
        assert_eq!(
            extractor.extract(Some(request("Text/Plain", b""))),
            Err(CodecError::ContentTypeNotSupported("text/plain".into()))
        );
    }

    #[test]
    fn first_match_wins_without_fallback() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let extractor = RequestExtractor::<v01::Event>::new(vec![
            Box::new(Recording {
                name: "first",
                reads: first.clone(),
                outcome: Err(CodecError::MalformedBody("boom".into())),
            }),
            Box::new(Recording {
                name: "second",
                reads: second.clone(),
                outcome: Ok(()),
            }),
        ]);

        let result = extractor.extract(Some(request("text/plain", b"")));
        assert_eq!(result, Err(CodecError::MalformedBody("boom".into())));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn binary_first_shadows_structured() {
        let extractor = RequestExtractor::<v01::Event>::new(vec![
            Box::new(BinaryConverter::new()),
            Box::new(StructuredConverter::new()),
        ]);
        let event = extractor
            .extract(Some(request(STRUCTURED_JSON, b"{}")))
            .unwrap();
        assert_eq!(event.data.as_ref().and_then(|d| d.as_bytes()), Some(&b"{}"[..]));
    }

    #[test]
    fn from_config_order_and_media_types() {
        let cfg = BindingConfig {
            structured_media_types: vec![STRUCTURED_JSON.into(), "application/json".into()],
            ..Default::default()
        };
        let extractor = RequestExtractor::<v02::Event>::from_config(&cfg).unwrap();
        assert_eq!(extractor.converter_names(), ["structured", "binary"]);
        assert_eq!(extractor.media_types(), [STRUCTURED_JSON, "application/json"]);

        let cfg = BindingConfig {
            binary_fallback: false,
            ..Default::default()
        };
        let extractor = RequestExtractor::<v02::Event>::from_config(&cfg).unwrap();
        assert_eq!(extractor.converter_names(), ["structured"]);
        assert!(extractor.writer_for("text/plain").is_none());
    }

    #[test]
    fn from_config_validates() {
        let cfg = BindingConfig {
            structured_media_types: Vec::new(),
            ..Default::default()
        };
        assert_eq!(
            RequestExtractor::<v02::Event>::from_config(&cfg).unwrap_err(),
            ConfigError::EmptyStructuredMediaTypes
        );
    }

    #[test]
    fn to_response_picks_writer_by_media_type() {
        let event = v02::Event::builder()
            .event_type("t")
            .source("/s")
            .id("1")
            .build()
            .unwrap();
        let extractor = RequestExtractor::<v02::Event>::default();

        let structured = extractor
            .to_response(&event, "application/cloudevents+json; charset=utf-8")
            .unwrap();
        let decoded: v02::Event = serde_json::from_slice(structured.body()).unwrap();
        assert_eq!(decoded, event);
        assert!(structured.headers().get("ce-id").is_none());

        let binary = extractor.to_response(&event, "text/plain").unwrap();
        assert_eq!(binary.headers()["ce-id"], "1");
        assert_eq!(binary.headers()[CONTENT_TYPE], "text/plain");
        assert!(binary.body().is_empty());
    }

    #[test]
    fn encode_without_writer() {
        let extractor =
            RequestExtractor::<v02::Event>::new(vec![Box::new(StructuredConverter::new())]);
        let event = v02::Event::blank();
        let err = extractor
            .encode(&event, "text/plain", &mut HeaderMap::new(), &mut Vec::new())
            .unwrap_err();
        assert_eq!(err, CodecError::ContentTypeNotSupported("text/plain".into()));
    }

    #[test]
    fn from_http_request_uses_default_registry() {
        let event = v01::Event::from_http_request(Some(request("text/plain", b""))).unwrap();
        assert_eq!(event.source, "dispatch");
        assert!(event.data.is_none());
    }
}
