//! Version-agnostic decoding.
//!
//! A request can carry either schema version. The version is looked up in
//! this order, first hit wins:
//!
//! 1. `Ce-Specversion` header (0.2 binary mode)
//! 2. `Ce-Cloudeventsversion` header (0.1 binary mode)
//! 3. `specversion` / `cloudEventsVersion` member of a structured JSON body
//!
//! Without an explicit version, the identity attributes decide: `eventID` or
//! `eventType` (`Ce-Eventid` / `Ce-Eventtype` in binary mode) mean 0.1, `id`
//! or `type` (`Ce-Id` / `Ce-Type`) mean 0.2. Anything else is decoded as 0.2.
use std::io::Read;

use binding::{CodecError, RequestExtractor, STRUCTURED_JSON};
use event::{CloudEvent, EventData, Extensions, SpecVersion, v01, v02};
use http::{HeaderMap, Request};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::Error;

const SPEC_VERSION_HEADERS: [&str; 2] = ["Ce-Specversion", "Ce-Cloudeventsversion"];
const SPEC_VERSION_MEMBERS: [&str; 2] = ["specversion", "cloudEventsVersion"];

// Identity attributes that only one version names this way.
const V01_HEADERS: [&str; 2] = ["Ce-Eventid", "Ce-Eventtype"];
const V02_HEADERS: [&str; 2] = ["Ce-Id", "Ce-Type"];
const V01_MEMBERS: [&str; 2] = ["eventID", "eventType"];
const V02_MEMBERS: [&str; 2] = ["id", "type"];

/// Version used when a request declares none.
pub const DEFAULT_SPEC_VERSION: SpecVersion = SpecVersion::V02;

/// An event of whichever version the request carried.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnyEvent {
    V01(v01::Event),
    V02(v02::Event),
}

macro_rules! each {
    ($self:expr, $event:ident => $body:expr) => {
        match $self {
            AnyEvent::V01($event) => $body,
            AnyEvent::V02($event) => $body,
        }
    };
}

impl AnyEvent {
    pub fn version(&self) -> SpecVersion {
        match self {
            AnyEvent::V01(_) => SpecVersion::V01,
            AnyEvent::V02(_) => SpecVersion::V02,
        }
    }

    pub fn id(&self) -> &str {
        each!(self, event => event.id())
    }

    pub fn source(&self) -> &str {
        each!(self, event => event.source())
    }

    pub fn event_type(&self) -> &str {
        each!(self, event => event.event_type())
    }

    pub fn data(&self) -> Option<&EventData> {
        each!(self, event => event.data())
    }

    pub fn extensions(&self) -> &Extensions {
        each!(self, event => event.extensions())
    }

    /// Attribute lookup by the version's own attribute name.
    pub fn get(&self, name: &str) -> Option<Value> {
        each!(self, event => event.get(name))
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<(), Error> {
        each!(self, event => event.set(name, value).map_err(Error::from))
    }

    pub fn validate(&self) -> Result<(), Error> {
        each!(self, event => event.validate().map_err(Error::from))
    }
}

impl From<v01::Event> for AnyEvent {
    fn from(event: v01::Event) -> Self {
        AnyEvent::V01(event)
    }
}

impl From<v02::Event> for AnyEvent {
    fn from(event: v02::Event) -> Self {
        AnyEvent::V02(event)
    }
}

/// Version string declared or implied by a request, if any.
///
/// The body is only consulted for structured requests.
pub fn detect_version(headers: &HeaderMap, body: &[u8]) -> Result<Option<String>, CodecError> {
    for name in SPEC_VERSION_HEADERS {
        if let Some(value) = headers.get(name) {
            let value = value.to_str().map_err(|err| CodecError::MalformedHeader {
                field: name.to_string(),
                cause: err.to_string(),
            })?;
            if !value.is_empty() {
                return Ok(Some(value.to_string()));
            }
        }
    }

    let structured = binding::media_type(headers).is_ok_and(|media_type| media_type == STRUCTURED_JSON);
    if !structured {
        return Ok(infer_from_headers(headers).map(|version| version.as_str().to_string()));
    }
    // An unparseable body is left for the structured converter to report.
    let Ok(Value::Object(document)) = serde_json::from_slice::<Value>(body) else {
        return Ok(None);
    };
    let declared = SPEC_VERSION_MEMBERS
        .iter()
        .find_map(|member| document.get(*member).and_then(Value::as_str))
        .map(str::to_string);
    Ok(declared.or_else(|| infer_from_members(&document).map(|version| version.as_str().to_string())))
}

fn infer_from_headers(headers: &HeaderMap) -> Option<SpecVersion> {
    let present = |names: &[&str]| names.iter().any(|name| headers.contains_key(*name));
    if present(&V01_HEADERS[..]) {
        Some(SpecVersion::V01)
    } else if present(&V02_HEADERS[..]) {
        Some(SpecVersion::V02)
    } else {
        None
    }
}

fn infer_from_members(document: &serde_json::Map<String, Value>) -> Option<SpecVersion> {
    let present = |names: &[&str]| names.iter().any(|name| document.contains_key(*name));
    if present(&V01_MEMBERS[..]) {
        Some(SpecVersion::V01)
    } else if present(&V02_MEMBERS[..]) {
        Some(SpecVersion::V02)
    } else {
        None
    }
}

/// Decodes a request of either version.
///
/// # Errors
///
/// [`Error::UnsupportedType`] when the declared version is not one this
/// crate models, otherwise whatever the selected converter reports.
pub fn from_http_request_any<B: Read>(request: Option<Request<B>>) -> Result<AnyEvent, Error> {
    let request = request.ok_or(CodecError::NilRequest)?;
    let (parts, mut body) = request.into_parts();
    let mut buf = Vec::new();
    body.read_to_end(&mut buf)
        .map_err(|err| CodecError::MalformedBody(err.to_string()))?;

    let version = match detect_version(&parts.headers, &buf)? {
        Some(declared) => declared
            .parse::<SpecVersion>()
            .map_err(|_| Error::UnsupportedType(declared))?,
        None => DEFAULT_SPEC_VERSION,
    };
    debug!(spec_version = %version, "version_detected");

    let event = match version {
        SpecVersion::V01 => RequestExtractor::<v01::Event>::default()
            .extract_parts(&parts.headers, &mut buf.as_slice())
            .map(AnyEvent::V01)?,
        SpecVersion::V02 => RequestExtractor::<v02::Event>::default()
            .extract_parts(&parts.headers, &mut buf.as_slice())
            .map(AnyEvent::V02)?,
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;
    use http::header::CONTENT_TYPE;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn header_versions_take_precedence() {
        let map = headers(&[
            ("ce-specversion", "0.2"),
            ("ce-cloudeventsversion", "0.1"),
            ("content-type", STRUCTURED_JSON),
        ]);
        let body = br#"{"cloudEventsVersion":"0.1"}"#;
        assert_eq!(detect_version(&map, body).unwrap().as_deref(), Some("0.2"));

        let map = headers(&[("ce-cloudeventsversion", "0.1")]);
        assert_eq!(detect_version(&map, b"").unwrap().as_deref(), Some("0.1"));
    }

    #[test]
    fn structured_body_member() {
        let map = headers(&[("content-type", STRUCTURED_JSON)]);
        let body = br#"{"cloudEventsVersion":"0.1","eventType":"t"}"#;
        assert_eq!(detect_version(&map, body).unwrap().as_deref(), Some("0.1"));
    }

    #[test]
    fn v01_headers_imply_v01() {
        let map = headers(&[
            ("content-type", "text/plain"),
            ("ce-eventtype", "dispatch"),
            ("ce-eventid", "00001"),
        ]);
        assert_eq!(detect_version(&map, b"").unwrap().as_deref(), Some("0.1"));

        let map = headers(&[("ce-type", "dispatch"), ("ce-id", "1")]);
        assert_eq!(detect_version(&map, b"").unwrap().as_deref(), Some("0.2"));

        let map = headers(&[("ce-source", "/s")]);
        assert_eq!(detect_version(&map, b"").unwrap(), None);
    }

    #[test]
    fn structured_members_imply_version() {
        let map = headers(&[("content-type", STRUCTURED_JSON)]);
        let body = br#"{"eventType":"t","source":"/s","eventID":"1"}"#;
        assert_eq!(detect_version(&map, body).unwrap().as_deref(), Some("0.1"));

        let body = br#"{"type":"t","source":"/s","id":"1"}"#;
        assert_eq!(detect_version(&map, body).unwrap().as_deref(), Some("0.2"));

        let body = br#"{"specversion":"0.2","eventID":"1"}"#;
        assert_eq!(detect_version(&map, body).unwrap().as_deref(), Some("0.2"));
    }

    #[test]
    fn binary_body_is_not_inspected() {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = br#"{"specversion":"0.1"}"#;
        assert_eq!(detect_version(&map, body).unwrap(), None);
    }

    #[test]
    fn undecodable_body_declares_nothing() {
        let map = headers(&[("content-type", STRUCTURED_JSON)]);
        assert_eq!(detect_version(&map, b"[1, 2").unwrap(), None);
    }

    #[test]
    fn any_event_accessors() {
        let mut event = AnyEvent::from(
            v01::Event::builder()
                .event_type("t")
                .source("/s")
                .event_id("1")
                .build()
                .unwrap(),
        );
        assert_eq!(event.version(), SpecVersion::V01);
        assert_eq!(event.id(), "1");
        event.set("Foo", Value::from("bar")).unwrap();
        assert_eq!(event.get("Foo"), Some(Value::from("bar")));
        assert!(matches!(
            event.set("eventTime", Value::from("soon")),
            Err(Error::Event(_))
        ));
        assert!(event.validate().is_ok());
    }
}
