//! CloudEvents 0.2.
//!
//! Attribute names are lower-case (`specversion`, `type`, `id`, ...) and
//! extensions are top-level members of the JSON document. In binary mode
//! every attribute travels as a `ce-` header and any other `ce-` header is an
//! extension.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{EventData, Extensions};
use crate::error::EventError;
use crate::field::{FieldSpec, FieldValue, Timestamp};
use crate::v01::required;
use crate::{check_extension_names, check_version, CloudEvent, SpecVersion};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::plain("specversion"),
    FieldSpec::plain("type").required(),
    FieldSpec::plain("source").required(),
    FieldSpec::plain("id").required(),
    FieldSpec::timestamp("time"),
    FieldSpec::plain("schemaurl"),
    FieldSpec::plain("contenttype").header("Content-Type"),
    FieldSpec::extensions("extensions", "CE-"),
    FieldSpec::unmapped("data"),
];

fn default_version() -> String {
    SpecVersion::V02.as_str().to_string()
}

/// A CloudEvents 0.2 event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "specversion", default = "default_version")]
    pub spec_version: String,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Timestamp>,
    #[serde(rename = "schemaurl", default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
    #[serde(rename = "contenttype", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Event {
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }
}

fn text(value: &str) -> Option<FieldValue> {
    (!value.is_empty()).then(|| FieldValue::Text(value.to_string()))
}

impl CloudEvent for Event {
    const SPEC_VERSION: SpecVersion = SpecVersion::V02;
    const FIELDS: &'static [FieldSpec] = FIELDS;

    fn blank() -> Self {
        Self {
            spec_version: default_version(),
            event_type: String::new(),
            source: String::new(),
            id: String::new(),
            time: None,
            schema_url: None,
            content_type: None,
            data: None,
            extensions: Extensions::new(),
        }
    }

    fn spec_version(&self) -> &str {
        &self.spec_version
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "specversion" => text(&self.spec_version),
            "type" => text(&self.event_type),
            "source" => text(&self.source),
            "id" => text(&self.id),
            "time" => self.time.map(FieldValue::Timestamp),
            "schemaurl" => self.schema_url.as_deref().and_then(text),
            "contenttype" => self.content_type.as_deref().and_then(text),
            "extensions" => (!self.extensions.is_empty())
                .then(|| FieldValue::Extensions(self.extensions.clone())),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), EventError> {
        match name {
            "specversion" => {
                let version = value.into_text(name)?;
                check_version(SpecVersion::V02, &version)?;
                self.spec_version = version;
            }
            "type" => self.event_type = value.into_text(name)?,
            "source" => self.source = value.into_text(name)?,
            "id" => self.id = value.into_text(name)?,
            "time" => self.time = Some(value.into_timestamp(name)?),
            "schemaurl" => {
                self.schema_url = Some(value.into_text(name)?).filter(|v| !v.is_empty())
            }
            "contenttype" => {
                self.content_type = Some(value.into_text(name)?).filter(|v| !v.is_empty())
            }
            "extensions" => self.extensions = value.into_extensions(name)?,
            _ => return Err(EventError::invalid(name, "not a declared attribute")),
        }
        Ok(())
    }

    fn data(&self) -> Option<&EventData> {
        self.data.as_ref()
    }

    fn set_data(&mut self, data: Option<EventData>) {
        self.data = data;
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Builder for [`Event`].
///
/// ```rust
/// use event::{v02, CloudEvent};
///
/// let event = v02::Event::builder()
///     .id("1234-1234-1234")
///     .source("http://example.com/cloudevent")
///     .event_type("com.example.cloudevent")
///     .build()
///     .unwrap();
/// assert_eq!(event.spec_version(), "0.2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    spec_version: Option<String>,
    event_type: Option<String>,
    source: Option<String>,
    id: Option<String>,
    time: Option<Timestamp>,
    schema_url: Option<String>,
    content_type: Option<String>,
    extensions: Extensions,
    data: Option<EventData>,
}

impl EventBuilder {
    pub fn spec_version(mut self, value: impl Into<String>) -> Self {
        self.spec_version = Some(value.into());
        self
    }

    pub fn event_type(mut self, value: impl Into<String>) -> Self {
        self.event_type = Some(value.into());
        self
    }

    pub fn source(mut self, value: impl Into<String>) -> Self {
        self.source = Some(value.into());
        self
    }

    pub fn id(mut self, value: impl Into<String>) -> Self {
        self.id = Some(value.into());
        self
    }

    pub fn time(mut self, value: impl Into<Timestamp>) -> Self {
        self.time = Some(value.into());
        self
    }

    pub fn schema_url(mut self, value: impl Into<String>) -> Self {
        self.schema_url = Some(value.into());
        self
    }

    pub fn content_type(mut self, value: impl Into<String>) -> Self {
        self.content_type = Some(value.into());
        self
    }

    pub fn extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }

    pub fn data(mut self, value: impl Into<EventData>) -> Self {
        self.data = Some(value.into());
        self
    }

    pub fn build(self) -> Result<Event, EventError> {
        let spec_version = self.spec_version.unwrap_or_else(default_version);
        check_version(SpecVersion::V02, &spec_version)?;
        check_extension_names(FIELDS, &self.extensions)?;

        Ok(Event {
            spec_version,
            id: required("id", self.id)?,
            source: required("source", self.source)?,
            event_type: required("type", self.event_type)?,
            time: self.time,
            schema_url: self.schema_url,
            content_type: self.content_type,
            data: self.data,
            extensions: self.extensions,
        })
    }
}
