//! HTTP 接口测试

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use product_reviews::infrastructure::config::{CacheConfig, Config, ServerConfig};
use product_reviews::infrastructure::storage::db::init_memory_database;
use product_reviews::interfaces::http::{create_router, reviews_path};
use product_reviews::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

async fn test_app(config: Config) -> Router {
    let db = init_memory_database().await.expect("open database");
    let state = AppState::new(db, config).await.expect("build state");
    create_router(state)
}

/// Router whose review table is gone, so every store statement fails.
async fn broken_app(config: Config) -> Router {
    let db = init_memory_database().await.expect("open database");
    let state = AppState::new(db.clone(), config).await.expect("build state");
    db.call(|conn| conn.execute_batch("DROP TABLE product_reviews"))
        .await
        .expect("drop table");
    create_router(state)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.expect("request served");
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, location, body)
}

#[tokio::test]
async fn test_worked_example_over_http() {
    let app = test_app(Config::default()).await;

    let (status, location, created) = send(
        &app,
        json_request(
            Method::POST,
            "/ProductReviews/Create",
            json!({ "header": "Great", "content": "Loved it", "productId": 7, "isHidden": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(location.as_deref(), Some("/ProductReviews/1"));
    assert_eq!(created["id"], 1);
    assert_eq!(created["header"], "Great");
    assert_eq!(created["content"], "Loved it");
    assert_eq!(created["productId"], 7);
    assert_eq!(created["isHidden"], false);
    assert!(created["date"].is_string());

    let (status, _, visible) = send(&app, get("/ProductReviews/Visible/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(visible, json!([created.clone()]));

    let (status, _, body) = send(
        &app,
        json_request(
            Method::PATCH,
            "/ProductReviews/Visibility/1",
            json!([{ "op": "replace", "path": "/isHidden", "value": true }]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, _, visible) = send(&app, get("/ProductReviews/Visible/7")).await;
    assert_eq!(visible, json!([]));

    let (status, _, review) = send(&app, get("/ProductReviews/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["isHidden"], true);
    assert_eq!(review["date"], created["date"]);

    let (status, _, all) = send(&app, get("/ProductReviews")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_error_statuses() {
    let app = test_app(Config::default()).await;

    let (status, _, body) = send(&app, get("/ProductReviews/0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");

    let (status, _, _) = send(&app, get("/ProductReviews/Visible/-3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, get("/ProductReviews/12")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _, _) = send(
        &app,
        json_request(
            Method::PATCH,
            "/ProductReviews/Visibility/12",
            json!([{ "op": "replace", "path": "/isHidden", "value": true }]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app,
        json_request(Method::POST, "/ProductReviews/Create", Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&app, get("/ProductReviews/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_problem_body() {
    let app = test_app(Config::default()).await;

    let (status, _, body) = send(
        &app,
        json_request(
            Method::POST,
            "/ProductReviews/Create",
            json!({ "header": "", "content": "text", "productId": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
    assert!(body["errors"]["header"].is_array());

    send(
        &app,
        json_request(
            Method::POST,
            "/ProductReviews/Create",
            json!({ "header": "h", "content": "c", "productId": 1 }),
        ),
    )
    .await;

    let (status, _, body) = send(
        &app,
        json_request(
            Method::PATCH,
            "/ProductReviews/Visibility/1",
            json!([{ "op": "replace", "path": "/header", "value": "changed" }]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["/header"].is_array());
}

#[tokio::test]
async fn test_base_path_and_health() {
    let config = Config {
        server: ServerConfig {
            base_path: "api/".to_string(),
            ..ServerConfig::default()
        },
        ..Config::default()
    };
    assert_eq!(reviews_path(&config.server), "/api/ProductReviews");

    let app = test_app(config).await;

    let (status, location, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/ProductReviews/Create",
            json!({ "header": "h", "content": "c", "productId": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(location.as_deref(), Some("/api/ProductReviews/1"));

    let (status, _, _) = send(&app, get("/ProductReviews")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_body_that_does_not_fit_is_a_validation_problem() {
    let app = test_app(Config::default()).await;

    let (status, _, body) = send(
        &app,
        json_request(
            Method::POST,
            "/ProductReviews/Create",
            json!({ "content": "c", "productId": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
    assert!(body["errors"]["header"][0]
        .as_str()
        .unwrap()
        .contains("missing field"));

    let (status, _, body) = send(
        &app,
        json_request(
            Method::POST,
            "/ProductReviews/Create",
            json!({ "header": "h", "content": "c", "productId": "seven" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["productId"].is_array());

    let (status, _, body) = send(
        &app,
        json_request(Method::PATCH, "/ProductReviews/Visibility/1", json!(3)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["body"].is_array());

    // Malformed JSON is not a validation failure
    let request = Request::builder()
        .method(Method::POST)
        .uri("/ProductReviews/Create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .expect("valid request");
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, all) = send(&app, get("/ProductReviews")).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn test_store_failure_is_an_internal_error() {
    let config = Config {
        cache: CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        },
        ..Config::default()
    };
    let app = broken_app(config).await;

    let (status, _, body) = send(&app, get("/ProductReviews")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "An unexpected error occurred.");

    let (status, location, body) = send(
        &app,
        json_request(
            Method::POST,
            "/ProductReviews/Create",
            json!({ "header": "h", "content": "c", "productId": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(location, None);
    assert_eq!(body["error"], "internal_error");
}
