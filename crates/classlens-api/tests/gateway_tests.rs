//! Gateway integration tests.
//!
//! Drives the full router against mocked downstream services: the
//! aggregate happy path, the validation matrix, fail-fast pipeline
//! errors, and the proxy passthrough.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use classlens_api::{create_router, AppState, GatewayConfig};
use classlens_downstream::{ClientConfig, DownstreamClient, ServiceRegistry};

const BOUNDARY: &str = "classlens-test-boundary";
const TIMESTAMP: &str = "2024-03-15T10:30:00Z";

fn test_app(server: &MockServer) -> Router {
    test_app_with_client_config(server, ClientConfig::default())
}

fn test_app_with_client_config(server: &MockServer, client_config: ClientConfig) -> Router {
    let registry =
        ServiceRegistry::new(server.uri(), server.uri(), server.uri(), server.uri());
    let downstream =
        DownstreamClient::new(registry, client_config).expect("client builds");
    let config = GatewayConfig {
        rate_limit_rps: 1000,
        ..GatewayConfig::default()
    };
    create_router(AppState::with_downstream(config, Arc::new(downstream)), None)
}

/// Build a multipart/form-data body from (name, filename, bytes) parts.
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: image/jpeg\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn frame_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/process-frame")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn full_frame_request() -> Request<Body> {
    frame_request(&[
        ("image", Some("frame.jpg"), b"frame-bytes"),
        ("lectureId", None, b"lecture-42"),
        ("timestamp", None, TIMESTAMP.as_bytes()),
    ])
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Mount the full two-face scenario on one mock server.
async fn mount_two_face_scenario(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/localize-coords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coordinates": [
                {"x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0},
                {"x": 20.0, "y": 20.0, "width": 10.0, "height": 10.0}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/localize-faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "faces": [STANDARD.encode(b"face-1"), STANDARD.encode(b"face-2")]
        })))
        .mount(server)
        .await;

    // Per-face responses keyed off the face crop bytes in the form body
    Mock::given(method("POST"))
        .and(path("/identify"))
        .and(body_string_contains("face-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"person_id": "p1", "status": "new"})),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identify"))
        .and(body_string_contains("face-2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"person_id": "p2", "status": "found"})),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/detect-face-attention"))
        .and(body_string_contains("face-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attention_status": "focused",
            "confidence": 0.9
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/detect-face-attention"))
        .and(body_string_contains("face-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attention_status": "unfocused",
            "confidence": 0.4
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/detect-hand-raising"))
        .and(body_string_contains("face-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_hand_raised": true,
            "confidence": 0.8,
            "hand_position": {"x": 5.0, "y": 2.0}
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/detect-hand-raising"))
        .and(body_string_contains("face-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_hand_raised": false,
            "confidence": 0.7
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn two_face_frame_aggregates_and_summarizes() {
    let server = MockServer::start().await;
    mount_two_face_scenario(&server).await;
    let app = test_app(&server);

    let response = app.oneshot(full_frame_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["lecture_id"], "lecture-42");
    assert_eq!(body["timestamp"], TIMESTAMP);
    assert_eq!(body["total_faces"], 2);

    // Order follows Localization's output order
    let faces = body["faces"].as_array().unwrap();
    assert_eq!(faces.len(), 2);
    assert_eq!(faces[0]["person_id"], "p1");
    assert_eq!(faces[0]["recognition_status"], "new");
    assert_eq!(faces[0]["attention_status"], "focused");
    assert_eq!(faces[0]["hand_raising_status"]["is_hand_raised"], true);
    assert_eq!(faces[0]["bounding_box"]["x"], 0.0);
    assert_eq!(faces[1]["person_id"], "p2");
    assert_eq!(faces[1]["recognition_status"], "found");
    assert_eq!(faces[1]["attention_status"], "unfocused");
    assert_eq!(faces[1]["hand_raising_status"]["is_hand_raised"], false);
    assert_eq!(faces[1]["bounding_box"]["x"], 20.0);

    assert_eq!(
        body["summary"],
        json!({
            "new_faces": 1,
            "known_faces": 1,
            "focused_faces": 1,
            "unfocused_faces": 1,
            "hands_raised": 1
        })
    );
}

#[tokio::test]
async fn identical_requests_yield_identical_payloads() {
    let server = MockServer::start().await;
    mount_two_face_scenario(&server).await;
    let app = test_app(&server);

    let first = app.clone().oneshot(full_frame_request()).await.unwrap();
    let second = app.oneshot(full_frame_request()).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let first_bytes = axum::body::to_bytes(first.into_body(), usize::MAX)
        .await
        .unwrap();
    let second_bytes = axum::body::to_bytes(second.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn missing_image_rejected_before_any_downstream_call() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = app
        .oneshot(frame_request(&[
            ("lectureId", None, b"lecture-42"),
            ("timestamp", None, TIMESTAMP.as_bytes()),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Image is required");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_lecture_id_rejected_before_any_downstream_call() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = app
        .oneshot(frame_request(&[
            ("image", Some("frame.jpg"), b"frame-bytes"),
            ("timestamp", None, TIMESTAMP.as_bytes()),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Lecture ID is required");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_timestamp_rejected_before_any_downstream_call() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = app
        .oneshot(frame_request(&[
            ("image", Some("frame.jpg"), b"frame-bytes"),
            ("lectureId", None, b"lecture-42"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Timestamp is required");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_canonical_timestamp_rejected_before_any_downstream_call() {
    let server = MockServer::start().await;

    for bad in ["not-a-timestamp", "2024-03-15T10:30:00", "2024-03-15T10:30:00.000000Z"] {
        let response = test_app(&server)
            .oneshot(frame_request(&[
                ("image", Some("frame.jpg"), b"frame-bytes"),
                ("lectureId", None, b"lecture-42"),
                ("timestamp", None, bad.as_bytes()),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "timestamp {bad:?}");
        let body = response_json(response).await;
        assert_eq!(body["error"], "Invalid timestamp format. Must be ISO 8601");
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn coords_failure_fails_frame_without_per_face_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/localize-coords"))
        .respond_with(ResponseTemplate::new(503).set_body_string("localization down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/localize-faces"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"faces": [STANDARD.encode(b"face-1")]})),
        )
        .mount(&server)
        .await;

    let app = test_app(&server);
    let response = app.oneshot(full_frame_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Pipeline Error");
    assert_eq!(body["details"], "localization down");

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests.iter().all(|r| r.url.path().starts_with("/localize")),
        "no recognition/attention/hand-raising call may be issued"
    );
}

#[tokio::test]
async fn downstream_timeout_is_a_pipeline_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/localize-coords"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"coordinates": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/localize-faces"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"faces": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let app = test_app_with_client_config(
        &server,
        ClientConfig {
            timeout: Duration::from_millis(50),
        },
    );
    let response = app.oneshot(full_frame_request()).await.unwrap();

    // A timed-out call fails the frame like any other transport error
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Pipeline Error");
    assert_eq!(body["details"], "No additional details available");
    assert!(body.get("faces").is_none());
}

#[tokio::test]
async fn localization_length_mismatch_is_a_pipeline_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/localize-coords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coordinates": [{"x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/localize-faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "faces": [STANDARD.encode(b"face-1"), STANDARD.encode(b"face-2")]
        })))
        .mount(&server)
        .await;

    let app = test_app(&server);
    let response = app.oneshot(full_frame_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Pipeline Error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Mismatch between detected faces and coordinates"));
}

#[tokio::test]
async fn one_failing_face_fails_the_whole_frame() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/localize-coords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coordinates": [
                {"x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0},
                {"x": 20.0, "y": 20.0, "width": 10.0, "height": 10.0},
                {"x": 40.0, "y": 40.0, "width": 10.0, "height": 10.0}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/localize-faces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "faces": [
                STANDARD.encode(b"face-1"),
                STANDARD.encode(b"face-2"),
                STANDARD.encode(b"face-3")
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"person_id": "p1", "status": "found"})),
        )
        .mount(&server)
        .await;

    // Attention fails for face #2 only
    Mock::given(method("POST"))
        .and(path("/detect-face-attention"))
        .and(body_string_contains("face-2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("attention crashed"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/detect-face-attention"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attention_status": "focused",
            "confidence": 0.9
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/detect-hand-raising"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_hand_raised": false,
            "confidence": 0.7
        })))
        .mount(&server)
        .await;

    let app = test_app(&server);
    let response = app.oneshot(full_frame_request()).await.unwrap();

    // No partial success: faces #1 and #3 must not appear anywhere
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Pipeline Error");
    assert_eq!(body["details"], "attention crashed");
    assert!(body.get("faces").is_none());
    assert!(body.get("summary").is_none());
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Gateway is running");
}

#[tokio::test]
async fn proxy_relays_downstream_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/model/info"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"model": "arcface-r50"})),
        )
        .mount(&server)
        .await;

    let app = test_app(&server);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/recognition/model/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["model"], "arcface-r50");
}

#[tokio::test]
async fn proxy_rejects_unknown_service() {
    let server = MockServer::start().await;
    let app = test_app(&server);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/telepathy/read-minds")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Service 'telepathy' not found");
    assert!(server.received_requests().await.unwrap().is_empty());
}
