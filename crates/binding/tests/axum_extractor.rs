//! Integration tests for the axum adapters
//!
//! Requests are driven through a real `Router` with `tower::ServiceExt::oneshot`.
#![cfg(feature = "axum")]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::Router;
use binding::axum::{Binary, CloudEventRequest, Structured, DEFAULT_BODY_LIMIT};
use event::{v01, v02};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

async fn echo_binary(CloudEventRequest(event): CloudEventRequest<v02::Event>) -> Binary<v02::Event> {
    Binary(event)
}

async fn echo_structured(
    CloudEventRequest(event): CloudEventRequest<v01::Event>,
) -> Structured<v01::Event> {
    Structured(event)
}

fn app() -> Router {
    Router::new()
        .route("/v02", post(echo_binary))
        .route("/v01", post(echo_structured))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn test_binary_request_echoed_as_binary() {
    let request = Request::post("/v02")
        .header("content-type", "text/plain")
        .header("ce-specversion", "0.2")
        .header("ce-type", "com.example.ping")
        .header("ce-source", "/sensor")
        .header("ce-id", "42")
        .header("ce-traceparent", "00-abc")
        .body(Body::from("ping"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers["ce-id"], "42");
    assert_eq!(headers["ce-type"], "com.example.ping");
    assert_eq!(headers["ce-traceparent"], "00-abc");
    assert_eq!(headers["content-type"], "text/plain");
    assert_eq!(body_bytes(response).await, b"ping");
}

#[tokio::test]
async fn test_binary_request_echoed_as_structured() {
    let request = Request::post("/v01")
        .header("content-type", "application/octet-stream")
        .header("ce-eventtype", "dispatch")
        .header("ce-source", "dispatch")
        .header("ce-eventid", "00001")
        .header("ce-eventtime", "2018-08-08T15:00:00-07:00")
        .header("ce-x-foo", "bar")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/cloudevents+json"
    );

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["eventType"], "dispatch");
    assert_eq!(json["eventID"], "00001");
    assert_eq!(json["eventTime"], "2018-08-08T15:00:00-07:00");
    assert_eq!(json["extensions"]["Foo"], "bar");
    assert!(json.get("data").is_none());
}

#[tokio::test]
async fn test_missing_required_header_is_bad_request() {
    let request = Request::post("/v02")
        .header("content-type", "text/plain")
        .header("ce-type", "com.example.ping")
        .header("ce-source", "/sensor")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"]["code"], "MISSING_REQUIRED_PROPERTY");
    assert!(json["error"]["message"].as_str().unwrap().contains("Ce-Id"));
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let request = Request::post("/v02").body(Body::empty()).unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"]["code"], "CONTENT_TYPE_PARSE");
}

#[tokio::test]
async fn test_malformed_structured_body() {
    let request = Request::post("/v01")
        .header("content-type", "application/cloudevents+json")
        .body(Body::from("{\"eventType\": "))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"]["code"], "MALFORMED_BODY");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let request = Request::post("/v02")
        .header("content-type", "text/plain")
        .header("ce-type", "t")
        .header("ce-source", "/s")
        .header("ce-id", "1")
        .body(Body::from(vec![b'x'; DEFAULT_BODY_LIMIT + 1]))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
