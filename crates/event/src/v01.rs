//! CloudEvents 0.1.
//!
//! Attribute names follow the 0.1 JSON format (`eventType`, `eventID`, ...)
//! and extensions sit in a nested `extensions` object. In binary mode every
//! attribute travels as a `CE-` header and extensions use the `CE-X-` family.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{EventData, Extensions};
use crate::error::EventError;
use crate::field::{FieldSpec, FieldValue, Timestamp};
use crate::{check_extension_names, check_version, CloudEvent, SpecVersion};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::plain("eventType").required(),
    FieldSpec::plain("eventTypeVersion"),
    FieldSpec::plain("cloudEventsVersion"),
    FieldSpec::plain("source").required(),
    FieldSpec::plain("eventID").required(),
    FieldSpec::timestamp("eventTime"),
    FieldSpec::plain("schemaURL"),
    FieldSpec::plain("contentType").header("Content-Type"),
    FieldSpec::extensions("extensions", "CE-X-"),
    FieldSpec::unmapped("data"),
];

fn default_version() -> String {
    SpecVersion::V01.as_str().to_string()
}

/// A CloudEvents 0.1 event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_version: Option<String>,
    #[serde(default = "default_version")]
    pub cloud_events_version: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "eventID", default)]
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<Timestamp>,
    #[serde(rename = "schemaURL", default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
}

impl Event {
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }
}

fn text(value: &str) -> Option<FieldValue> {
    (!value.is_empty()).then(|| FieldValue::Text(value.to_string()))
}

fn optional_text(value: &Option<String>) -> Option<FieldValue> {
    value.as_deref().and_then(text)
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl CloudEvent for Event {
    const SPEC_VERSION: SpecVersion = SpecVersion::V01;
    const FIELDS: &'static [FieldSpec] = FIELDS;

    fn blank() -> Self {
        Self {
            event_type: String::new(),
            event_type_version: None,
            cloud_events_version: default_version(),
            source: String::new(),
            event_id: String::new(),
            event_time: None,
            schema_url: None,
            content_type: None,
            extensions: Extensions::new(),
            data: None,
        }
    }

    fn spec_version(&self) -> &str {
        &self.cloud_events_version
    }

    fn id(&self) -> &str {
        &self.event_id
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "eventType" => text(&self.event_type),
            "eventTypeVersion" => optional_text(&self.event_type_version),
            "cloudEventsVersion" => text(&self.cloud_events_version),
            "source" => text(&self.source),
            "eventID" => text(&self.event_id),
            "eventTime" => self.event_time.map(FieldValue::Timestamp),
            "schemaURL" => optional_text(&self.schema_url),
            "contentType" => optional_text(&self.content_type),
            "extensions" => (!self.extensions.is_empty())
                .then(|| FieldValue::Extensions(self.extensions.clone())),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), EventError> {
        match name {
            "eventType" => self.event_type = value.into_text(name)?,
            "eventTypeVersion" => self.event_type_version = non_empty(value.into_text(name)?),
            "cloudEventsVersion" => {
                let version = value.into_text(name)?;
                check_version(SpecVersion::V01, &version)?;
                self.cloud_events_version = version;
            }
            "source" => self.source = value.into_text(name)?,
            "eventID" => self.event_id = value.into_text(name)?,
            "eventTime" => self.event_time = Some(value.into_timestamp(name)?),
            "schemaURL" => self.schema_url = non_empty(value.into_text(name)?),
            "contentType" => self.content_type = non_empty(value.into_text(name)?),
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
/// `build` fails unless event type, source and event id are all given.
///
/// ```rust
/// use event::{v01, EventError};
///
/// let err = v01::Event::builder().event_type("dispatch").build().unwrap_err();
/// assert_eq!(err, EventError::MissingRequiredAttribute("source".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBuilder {
    event_type: Option<String>,
    event_type_version: Option<String>,
    cloud_events_version: Option<String>,
    source: Option<String>,
    event_id: Option<String>,
    event_time: Option<Timestamp>,
    schema_url: Option<String>,
    content_type: Option<String>,
    extensions: Extensions,
    data: Option<EventData>,
}

impl EventBuilder {
    pub fn event_type(mut self, value: impl Into<String>) -> Self {
        self.event_type = Some(value.into());
        self
    }

    pub fn event_type_version(mut self, value: impl Into<String>) -> Self {
        self.event_type_version = Some(value.into());
        self
    }

    pub fn cloud_events_version(mut self, value: impl Into<String>) -> Self {
        self.cloud_events_version = Some(value.into());
        self
    }

    pub fn source(mut self, value: impl Into<String>) -> Self {
        self.source = Some(value.into());
        self
    }

    pub fn event_id(mut self, value: impl Into<String>) -> Self {
        self.event_id = Some(value.into());
        self
    }

    pub fn event_time(mut self, value: impl Into<Timestamp>) -> Self {
        self.event_time = Some(value.into());
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
        let cloud_events_version = self.cloud_events_version.unwrap_or_else(default_version);
        check_version(SpecVersion::V01, &cloud_events_version)?;
        check_extension_names(FIELDS, &self.extensions)?;

        Ok(Event {
            event_type: required("eventType", self.event_type)?,
            event_type_version: self.event_type_version,
            cloud_events_version,
            source: required("source", self.source)?,
            event_id: required("eventID", self.event_id)?,
            event_time: self.event_time,
            schema_url: self.schema_url,
            content_type: self.content_type,
            extensions: self.extensions,
            data: self.data,
        })
    }
}

pub(crate) fn required(name: &str, value: Option<String>) -> Result<String, EventError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EventError::MissingRequiredAttribute(name.to_string()))
}
