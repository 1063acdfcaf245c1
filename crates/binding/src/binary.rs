//! Binary content mode: attributes travel as headers, the body is the data.
//!
//! ```text
//! Ce-Eventtype: dispatch          ─┐
//! Ce-Source: dispatch              │  one header per resolved attribute
//! Ce-Eventid: 00001                │  (decoded in descriptor order,
//! Ce-Eventtime: 2018-08-08T...     │   first failure wins)
//! Ce-X-Foo: bar                   ─┘  extension family, prefix stripped
//! Content-Type: text/plain
//!
//! <body>                              data, kept as raw bytes
//! ```
use std::io::{Read, Write};

use event::{
    extension_from_header_values, extension_header_values, parse_timestamp, resolve, CloudEvent,
    EventData, Extensions, FieldKind, FieldMetadata, FieldValue,
};
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};

use crate::converter::HttpConverter;
use crate::error::CodecError;
use crate::wire::{declared_length, read_body};

/// Catch-all converter mapping attributes to `Ce-*` headers.
///
/// It claims every media type, so it belongs at the end of a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryConverter {
    max_body_bytes: Option<usize>,
}

impl BinaryConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of body bytes buffered on read.
    pub fn with_max_body_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

fn descriptor<E: CloudEvent>() -> Result<Vec<FieldMetadata>, CodecError> {
    resolve::<E>().map_err(|err| CodecError::InvalidDescriptor(err.to_string()))
}

/// First value of `name`, `None` when absent or empty.
fn header_text(headers: &HeaderMap, name: &str) -> Result<Option<String>, CodecError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|err| CodecError::malformed_header(name, err))?;
    Ok((!text.is_empty()).then(|| text.to_string()))
}

fn read_extensions(
    family: &FieldMetadata,
    fields: &[FieldMetadata],
    headers: &HeaderMap,
) -> Result<Extensions, CodecError> {
    let mut extensions = Extensions::new();
    for name in headers.keys() {
        let name = name.as_str();
        if fields.iter().any(|field| field.matches_header(name)) {
            continue;
        }
        let Some(key) = family.extension_key(name) else {
            continue;
        };
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| {
                value
                    .to_str()
                    .map(str::to_string)
                    .map_err(|err| CodecError::malformed_header(&family.extension_header(&key), err))
            })
            .collect::<Result<Vec<_>, _>>()?;
        extensions.insert(key, extension_from_header_values(values));
    }
    Ok(extensions)
}

fn header_name(name: &str) -> Result<HeaderName, CodecError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|err| CodecError::Encode(format!("{name}: {err}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, CodecError> {
    HeaderValue::from_str(value).map_err(|err| CodecError::Encode(format!("{name}: {err}")))
}

impl<E: CloudEvent> HttpConverter<E> for BinaryConverter {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn can_read(&self, _media_type: &str) -> bool {
        true
    }

    fn can_write(&self, _media_type: &str) -> bool {
        true
    }

    fn supported_media_types(&self) -> &[String] {
        &[]
    }

    fn read(&self, headers: &HeaderMap, body: &mut dyn Read) -> Result<E, CodecError> {
        let fields = descriptor::<E>()?;
        let mut event = E::blank();

        for field in &fields {
            let value = match field.kind {
                FieldKind::ExtensionMap => {
                    let extensions = read_extensions(field, &fields, headers)?;
                    if extensions.is_empty() {
                        continue;
                    }
                    FieldValue::Extensions(extensions)
                }
                kind => {
                    let Some(text) = header_text(headers, &field.wire_name)? else {
                        if field.required {
                            return Err(CodecError::MissingRequiredProperty(field.wire_name.clone()));
                        }
                        continue;
                    };
                    if kind == FieldKind::Timestamp {
                        let time = parse_timestamp(&text)
                            .map_err(|err| CodecError::malformed_header(&field.wire_name, err))?;
                        FieldValue::Timestamp(time)
                    } else {
                        FieldValue::Text(text)
                    }
                }
            };
            event
                .set_field(field.name, value)
                .map_err(|err| CodecError::malformed_header(&field.wire_name, err))?;
        }

        if declared_length(headers) == Some(0) {
            return Ok(event);
        }
        let bytes = read_body(body, self.max_body_bytes)?;
        if !bytes.is_empty() {
            event.set_data(Some(EventData::from(bytes)));
        }
        Ok(event)
    }

    fn write(
        &self,
        event: &E,
        content_type: &str,
        headers: &mut HeaderMap,
        body: &mut dyn Write,
    ) -> Result<(), CodecError> {
        event.validate().map_err(CodecError::from_write_validation)?;

        let fields = descriptor::<E>()?;
        let mut has_content_type = false;
        for field in &fields {
            let Some(value) = event.field(field.name) else {
                continue;
            };
            match value {
                FieldValue::Extensions(extensions) => {
                    for (key, value) in &extensions {
                        let wire = field.extension_header(key);
                        if fields.iter().any(|declared| declared.matches_header(&wire)) {
                            return Err(CodecError::Encode(format!(
                                "extension {key} would overwrite the {wire} header"
                            )));
                        }
                        let name = header_name(&wire)?;
                        for text in extension_header_values(value) {
                            headers.append(name.clone(), header_value(&wire, &text)?);
                        }
                    }
                }
                FieldValue::Timestamp(time) => {
                    let name = header_name(&field.wire_name)?;
                    headers.insert(name, header_value(&field.wire_name, &time.to_rfc3339())?);
                }
                FieldValue::Text(text) => {
                    let name = header_name(&field.wire_name)?;
                    has_content_type |= name == CONTENT_TYPE;
                    headers.insert(name, header_value(&field.wire_name, &text)?);
                }
            }
        }

        if !has_content_type && !content_type.is_empty() {
            headers.insert(CONTENT_TYPE, header_value("Content-Type", content_type)?);
        }

        if let Some(data) = event.data() {
            let bytes = data.to_vec().map_err(|err| CodecError::Encode(err.to_string()))?;
            body.write_all(&bytes)
                .map_err(|err| CodecError::Encode(err.to_string()))?;
        }
        Ok(())
    }
}
