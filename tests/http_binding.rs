use std::io;

use cloudevents::{
    BinaryConverter, CodecError, Error, EventData, RequestExtractor, STRUCTURED_JSON,
    StructuredConverter, from_http_request, v01, v02,
};
use http::Request;
use serde_json::json;

fn dispatch_request(content_type: &str) -> http::request::Builder {
    Request::builder()
        .header("Content-Type", content_type)
        .header("Ce-Eventtype", "dispatch")
        .header("Ce-Source", "dispatch")
        .header("Ce-Eventid", "00001")
        .header("Ce-Eventtime", "2018-08-08T15:00:00-07:00")
}

#[test]
fn binary_request_with_extensions() {
    let request = dispatch_request("text/plain")
        .header("Ce-X-My-Extension", "myvalue")
        .header("Ce-X-Another-Extension", "anothervalue")
        .body(io::empty())
        .unwrap();

    let event: v01::Event = from_http_request(Some(request)).unwrap();
    assert_eq!(event.event_type, "dispatch");
    assert_eq!(event.source, "dispatch");
    assert_eq!(event.event_id, "00001");
    assert_eq!(
        event.event_time.map(|t| t.to_rfc3339()).as_deref(),
        Some("2018-08-08T15:00:00-07:00")
    );
    assert_eq!(event.content_type.as_deref(), Some("text/plain"));
    assert_eq!(event.extensions["My-Extension"], json!("myvalue"));
    assert_eq!(event.extensions["Another-Extension"], json!("anothervalue"));
    assert!(event.data.is_none());
}

#[test]
fn structured_request_ignores_attribute_headers() {
    let body = serde_json::to_vec(&json!({
        "eventType": "from-body",
        "eventTypeVersion": "0.1",
        "eventID": "00002",
        "source": "body",
        "data": {"answer": 42},
    }))
    .unwrap();
    let request = dispatch_request(STRUCTURED_JSON)
        .body(body.as_slice())
        .unwrap();

    let event: v01::Event = from_http_request(Some(request)).unwrap();
    assert_eq!(event.event_type, "from-body");
    assert_eq!(event.event_id, "00002");
    assert_eq!(event.event_type_version.as_deref(), Some("0.1"));
    assert!(event.event_time.is_none());
    assert_eq!(
        event.data.as_ref().and_then(EventData::as_json),
        Some(&json!({"answer": 42}))
    );
}

#[test]
fn missing_required_header_yields_no_event() {
    let request = Request::builder()
        .header("Content-Type", "text/plain")
        .header("Ce-Eventtype", "dispatch")
        .header("Ce-Eventid", "00001")
        .body(io::empty())
        .unwrap();

    let result: Result<v01::Event, Error> = from_http_request(Some(request));
    assert_eq!(
        result,
        Err(Error::Binding(CodecError::MissingRequiredProperty(
            "Ce-Source".into()
        )))
    );
}

#[test]
fn malformed_timestamp_names_header() {
    let request = Request::builder()
        .header("Content-Type", "text/plain")
        .header("Ce-Eventtype", "dispatch")
        .header("Ce-Source", "dispatch")
        .header("Ce-Eventid", "00001")
        .header("Ce-Eventtime", "yesterday")
        .body(io::empty())
        .unwrap();

    let err = from_http_request::<v01::Event, _>(Some(request)).unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(CodecError::MalformedHeader { ref field, .. }) if field == "Ce-Eventtime"
    ));
    assert_eq!(err.http_status_code(), 400);
}

#[test]
fn nil_request() {
    let result = from_http_request::<v02::Event, io::Empty>(None);
    assert_eq!(result, Err(Error::Binding(CodecError::NilRequest)));
}

#[test]
fn structured_only_registry_rejects_binary() {
    let extractor = RequestExtractor::<v01::Event>::new(vec![Box::new(StructuredConverter::new())]);
    let request = dispatch_request("text/plain").body(io::empty()).unwrap();

    let err = extractor.extract(Some(request)).unwrap_err();
    assert_eq!(err, CodecError::ContentTypeNotSupported("text/plain".into()));
    assert_eq!(err.http_status_code(), 415);
}

#[test]
fn binary_only_registry_reads_structured_media_type_as_binary() {
    let extractor = RequestExtractor::<v01::Event>::new(vec![Box::new(BinaryConverter::new())]);
    let request = dispatch_request(STRUCTURED_JSON)
        .body(&b"{\"not\":\"parsed\"}"[..])
        .unwrap();

    let event = extractor.extract(Some(request)).unwrap();
    assert_eq!(event.event_id, "00001");
    assert_eq!(
        event.data.as_ref().and_then(EventData::as_bytes),
        Some(&b"{\"not\":\"parsed\"}"[..])
    );
}

#[test]
fn declared_empty_body_is_not_read() {
    let request = dispatch_request("application/octet-stream")
        .header("Content-Length", "0")
        .body(&b"trailing bytes"[..])
        .unwrap();

    let event: v01::Event = from_http_request(Some(request)).unwrap();
    assert!(event.data.is_none());
}

#[test]
fn binary_response_round_trips_through_extraction() {
    let event = v02::Event::builder()
        .event_type("com.example.object.created")
        .source("/storage/bucket-1")
        .id("A234-1234-1234")
        .time(cloudevents::Timestamp::parse_from_rfc3339("2018-04-05T17:31:00Z").unwrap())
        .extension("Comexampleextension", "value")
        .data(b"<much wow=\"xml\"/>".to_vec())
        .build()
        .unwrap();

    let extractor = RequestExtractor::<v02::Event>::default();
    let response = extractor.to_response(&event, "text/xml").unwrap();

    let mut request = Request::builder();
    for (name, value) in response.headers() {
        request = request.header(name, value);
    }
    let request = request.body(response.body().as_slice()).unwrap();

    let decoded: v02::Event = from_http_request(Some(request)).unwrap();
    assert_eq!(decoded.id, event.id);
    assert_eq!(decoded.time, event.time);
    assert_eq!(decoded.content_type.as_deref(), Some("text/xml"));
    assert_eq!(decoded.extensions, event.extensions);
    assert_eq!(decoded.data, event.data);
}
