//! axum adapters: a request extractor, error responses, and typed
//! structured/binary responses.
//!
//! ```rust,ignore
//! use axum::{routing::post, Router};
//! use binding::axum::{Binary, CloudEventRequest};
//! use event::v02;
//!
//! async fn echo(CloudEventRequest(event): CloudEventRequest<v02::Event>) -> Binary<v02::Event> {
//!     Binary(event)
//! }
//!
//! let app: Router = Router::new().route("/events", post(echo));
//! ```
use std::error::Error as StdError;

use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use event::{CloudEvent, EventData};
use http_body_util::LengthLimitError;
use serde_json::json;

use crate::binary::BinaryConverter;
use crate::converter::HttpConverter;
use crate::error::CodecError;
use crate::extractor::RequestExtractor;
use crate::structured::StructuredConverter;
use crate::wire::{declared_length, STRUCTURED_JSON};

/// Bodies larger than this are rejected before decoding (axum's default limit).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Extracts an event in either content mode using the default registry.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudEventRequest<E>(pub E);

impl<S, E> FromRequest<S> for CloudEventRequest<E>
where
    S: Send + Sync,
    E: CloudEvent,
{
    type Rejection = CodecError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let limit = DEFAULT_BODY_LIMIT;
        if declared_length(&parts.headers).is_some_and(|len| len > limit as u64) {
            return Err(CodecError::PayloadTooLarge { limit });
        }

        let bytes = axum::body::to_bytes(body, limit).await.map_err(|err| {
            if is_length_limit(&err) {
                CodecError::PayloadTooLarge { limit }
            } else {
                CodecError::MalformedBody(err.to_string())
            }
        })?;

        RequestExtractor::<E>::default()
            .extract_parts(&parts.headers, &mut bytes.as_ref())
            .map(CloudEventRequest)
    }
}

fn is_length_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<LengthLimitError>() {
            return true;
        }
        current = err.source();
    }
    false
}

impl IntoResponse for CodecError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

fn encode<E: CloudEvent>(
    converter: &dyn HttpConverter<E>,
    event: &E,
    content_type: &str,
) -> Response {
    let mut headers = HeaderMap::new();
    let mut body = Vec::new();
    match converter.write(event, content_type, &mut headers, &mut body) {
        Ok(()) => (StatusCode::OK, headers, body).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Responds with the event as an `application/cloudevents+json` document.
#[derive(Debug, Clone, PartialEq)]
pub struct Structured<E>(pub E);

impl<E: CloudEvent> IntoResponse for Structured<E> {
    fn into_response(self) -> Response {
        encode(&StructuredConverter::new(), &self.0, STRUCTURED_JSON)
    }
}

/// Responds with attributes as `Ce-*` headers and the data as the body.
///
/// The content type is the event's own, else `application/json` for JSON
/// data and `application/octet-stream` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary<E>(pub E);

impl<E: CloudEvent> IntoResponse for Binary<E> {
    fn into_response(self) -> Response {
        let fallback = match self.0.data() {
            Some(EventData::Json(_)) => "application/json",
            _ => "application/octet-stream",
        };
        encode(&BinaryConverter::new(), &self.0, fallback)
    }
}
