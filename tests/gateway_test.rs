//! Gateway behavior driven through the full middleware stack.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use genx_server::http::response::REDACTED_MESSAGE;
use genx_server::http::X_REQUEST_ID;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

const MIB: usize = 1024 * 1024;

async fn send(environment: &str, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let server = common::build_server(common::config_for(environment));
    let response = server.router().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    (status, headers, common::json_body(response).await)
}

fn post_json(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

/// A JSON document of exactly `size` bytes.
fn json_of_size(size: usize) -> String {
    let overhead = r#"{"data":""}"#.len();
    format!(r#"{{"data":"{}"}}"#, "x".repeat(size - overhead))
}

#[tokio::test]
async fn health_reports_ok_and_environment() {
    let (status, _, body) = send("development", get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["environment"], "development");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn head_is_answered_by_get_routes() {
    let server = common::build_server(common::config_for("development"));
    let request = Request::builder()
        .method(Method::HEAD)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_endpoint() {
    let (status, _, body) = send("development", get("/api/test")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "test endpoint" }));
}

#[tokio::test]
async fn data_is_echoed_inside_received() {
    let sent = json!({ "test": "data", "nested": { "value": 123 } });
    let (status, _, body) = send("development", post_json("/api/data", sent.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": sent }));
}

#[tokio::test]
async fn scalars_and_nulls_survive_the_round_trip() {
    let sent = json!({ "a": 1, "b": [null, true, "x"] });
    let (status, _, body) = send("production", post_json("/api/data", sent.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": { "a": 1, "b": [null, true, "x"] } }));
}

#[tokio::test]
async fn empty_object_and_empty_body_decode_to_empty_mapping() {
    let (status, _, body) = send("development", post_json("/api/data", "{}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": {} }));

    let (status, _, body) = send("development", post_json("/api/data", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": {} }));
}

#[tokio::test]
async fn unknown_content_type_is_not_decoded() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/data")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("not json at all"))
        .unwrap();
    let (status, _, body) = send("development", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": {} }));
}

#[tokio::test]
async fn form_bodies_are_nested() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/data")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("user[name]=ada&tags[]=a&tags[]=b"))
        .unwrap();
    let (status, _, body) = send("development", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "received": { "user": { "name": "ada" }, "tags": ["a", "b"] } })
    );
}

#[tokio::test]
async fn deeply_bracketed_form_key_is_served() {
    let payload = format!("a{}=x", "[]".repeat(40_000));
    assert!(payload.len() < 100 * 1024);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/data")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(payload))
        .unwrap();
    let (status, _, body) = send("development", request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["received"]["a"][0][0][0][0][0].is_object());
}

#[tokio::test]
async fn any_json_value_round_trips_through_received() {
    let cases = [
        json!({ "l1": { "l2": { "l3": { "l4": { "l5": { "l6": "deep" } } } } } }),
        json!([[[[[["deep"]]]]]]),
        json!({ "text": "café résumé naïve", "emoji": "🚀📈💹", "cjk": "交易" }),
        json!({ "empty": "", "zero": 0, "false": false, "null": null }),
        json!({ "mixed": [1, "two", null, true, 3.5, { "k": [] }, []] }),
        json!({ "big": 9_007_199_254_740_991_i64, "neg": -42, "float": 0.1 }),
        json!({}),
        json!([]),
        json!(""),
        json!(0),
        json!(false),
        json!(null),
        json!("café 🚀"),
        json!([1, "a", null, false]),
    ];

    let server = common::build_server(common::config_for("development"));
    for sent in cases {
        let response = server
            .router()
            .oneshot(post_json("/api/data", sent.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{sent}");
        let body = common::json_body(response).await;
        assert_eq!(body, json!({ "received": sent.clone() }), "{sent}");
    }
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (status, _, body) = send("development", post_json("/api/data", "{ invalid json }")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Bad request", "message": "Invalid JSON format" }));
}

#[tokio::test]
async fn body_at_limit_is_accepted() {
    let payload = json_of_size(10 * MIB);
    assert_eq!(payload.len(), 10 * MIB);

    let mut request = post_json("/api/data", payload);
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, (10 * MIB).into());
    let (status, _, body) = send("development", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"]["data"].as_str().map(str::len), Some(10 * MIB - 11));
}

#[tokio::test]
async fn body_over_limit_is_rejected_before_parsing() {
    // One byte over, and not valid JSON: size is checked first.
    let payload = format!("{}!", json_of_size(10 * MIB));
    let (status, _, body) = send("development", post_json("/api/data", payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "Payload too large");
    assert_eq!(body["message"], format!("Request body exceeds {} bytes", 10 * MIB));
}

#[tokio::test]
async fn declared_length_over_limit_is_rejected() {
    let mut request = post_json("/api/data", "{}");
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, (10 * MIB + 1).into());
    let (status, _, _) = send("development", request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn form_limit_is_smaller() {
    let payload = format!("a={}", "x".repeat(100 * 1024));
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/data")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(payload))
        .unwrap();
    let (status, _, _) = send("development", request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn unmatched_route_is_not_found_with_original_url() {
    let (status, _, body) = send("development", get("/non-existent-route?x=1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found", "path": "/non-existent-route?x=1" }));
}

#[tokio::test]
async fn matching_is_exact() {
    for path in ["/API/TEST", "/api/test/", "/api"] {
        let (status, _, _) = send("development", get(path)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
    }

    let (status, _, _) = send("development", post_json("/api/test", "{}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn plain_get_on_root_is_not_found() {
    let (status, _, body) = send("development", get("/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], "/");
}

#[tokio::test]
async fn handler_fault_is_verbose_in_development() {
    let (status, _, body) = send("development", get("/api/error")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error", "message": "Test error" }));
}

#[tokio::test]
async fn handler_fault_is_redacted_elsewhere() {
    let (status, _, body) = send("production", get("/api/error")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["message"], REDACTED_MESSAGE);
}

#[tokio::test]
async fn handler_panic_becomes_internal_error() {
    let (status, _, body) = send("development", get("/api/panic")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "handler exploded");

    let (status, _, body) = send("staging", get("/api/panic")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], REDACTED_MESSAGE);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (_, headers, _) = send("development", get("/health")).await;
    assert!(headers.get(X_REQUEST_ID).is_some());

    let mut request = get("/nowhere");
    request
        .headers_mut()
        .insert(X_REQUEST_ID, "caller-supplied".parse().unwrap());
    let (_, headers, _) = send("development", request).await;
    assert_eq!(headers.get(X_REQUEST_ID).unwrap(), "caller-supplied");
}

#[tokio::test]
async fn allowed_origin_is_reflected_with_credentials() {
    let mut request = get("/api/test");
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());
    let (status, headers, _) = send("development", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn disallowed_origin_gets_no_allow_headers() {
    let mut request = get("/api/test");
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://evil.example".parse().unwrap());
    let (status, headers, _) = send("development", request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn preflight_is_answered_for_allowed_origin() {
    let server = common::build_server(common::config_for("development"));
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/data")
        .header(header::ORIGIN, "http://0.0.0.0:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://0.0.0.0:3000"
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(methods.contains("POST"));
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "content-type"
    );
}

#[tokio::test]
async fn served_over_tcp() {
    let server = common::spawn_server(common::config_for("development")).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .post(server.http_url("/api/data"))
        .json(&json!({ "test": "data", "nested": { "value": 123 } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["received"]["nested"]["value"], 123);

    let res = client.get(server.http_url("/missing")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.shutdown.trigger();
}
