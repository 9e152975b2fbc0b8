//! HTTP API integration tests.
//!
//! Requests are driven through the router in-process with
//! `tower::ServiceExt::oneshot`.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value as JsonValue};
use tabula_server::database::{Database, DatabaseConfig};
use tabula_server::http::router;
use tower::ServiceExt;

use common::{database, FlakySource, PRODUCT_COLUMNS};

fn app() -> Router {
    router(Arc::new(database()))
}

fn query_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn test_query_success() {
    let body = json!({ "query": "SELECT * FROM products;" }).to_string();
    let (status, body) = send(app(), query_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(PRODUCT_COLUMNS));
    assert_eq!(body["rows"].as_array().unwrap().len(), 10);
    assert_eq!(body["rows"][0][1], json!("Chai"));
    assert!(body["executionTime"].is_u64());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_aggregate_values_are_json_numbers() {
    let body = json!({ "query": "SELECT COUNT(*) AS n, MAX(unit_price) FROM products" }).to_string();
    let (status, body) = send(app(), query_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(["n", "MAX(unit_price)"]));
    assert_eq!(body["rows"][0][0], json!(10));
}

#[tokio::test]
async fn test_invalid_request_bodies() {
    let bodies = [
        "{}".to_string(),
        json!({ "query": 5 }).to_string(),
        json!({ "query": "" }).to_string(),
        json!({ "query": null }).to_string(),
        "not json".to_string(),
    ];
    for body in bodies {
        let (status, response) = send(app(), query_request(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(response, json!({ "error": "Invalid query" }), "body: {}", body);
    }
}

#[tokio::test]
async fn test_missing_content_type_is_invalid_query() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/query")
        .body(Body::from(json!({ "query": "SELECT 1" }).to_string()))
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid query"));
}

#[tokio::test]
async fn test_sql_errors_are_bad_requests() {
    for sql in ["SELEC * FROM products", "SELECT 1/0", "SELECT nope FROM products"] {
        let body = json!({ "query": sql }).to_string();
        let (status, response) = send(app(), query_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query: {}", sql);
        let message = response["error"].as_str().unwrap();
        assert!(message.starts_with("SQL Error: "), "message: {}", message);
    }
}

#[tokio::test]
async fn test_load_failure_is_service_unavailable() {
    let db = Database::with_source(Arc::new(FlakySource::new(usize::MAX)), DatabaseConfig::default());
    let app = router(Arc::new(db));

    let body = json!({ "query": "SELECT * FROM products" }).to_string();
    let (status, response) = send(app.clone(), query_request(body)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response,
        json!({ "error": "Database is not ready yet. Please try again later." })
    );

    let (status, response) = send(app, get_request("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["ready"], json!(false));
    let message = response["message"].as_str().unwrap();
    assert!(message.starts_with("Database failed to load: "), "message: {}", message);
}

#[tokio::test]
async fn test_status_before_and_after_first_query() {
    let app = app();

    let (status, response) = send(app.clone(), get_request("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response,
        json!({ "ready": false, "message": "Database not initialized" })
    );

    let body = json!({ "query": "SELECT * FROM shippers" }).to_string();
    let (status, _) = send(app.clone(), query_request(body)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, response) = send(app, get_request("/api/status")).await;
    assert_eq!(response["ready"], json!(true));
    assert!(response["message"].is_null());
}

#[tokio::test]
async fn test_examples() {
    let (status, response) = send(app(), get_request("/api/examples")).await;
    assert_eq!(status, StatusCode::OK);

    let examples = response.as_array().unwrap();
    assert_eq!(examples.len(), 7);
    assert_eq!(examples[0]["id"], json!(1));
    assert_eq!(examples[0]["query"], json!("SELECT * FROM products;"));
    for example in examples {
        assert!(example["name"].is_string());
        assert!(example["description"].is_string());
    }
}

#[tokio::test]
async fn test_unknown_route() {
    let response = app().oneshot(get_request("/api/nothing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
