#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use movie_reviews_api::auth::{generate_jwt, Claims};
use movie_reviews_api::config::AppConfig;
use movie_reviews_api::database::MemoryStore;
use movie_reviews_api::{app, AppState};

pub const TEST_SECRET: &str = "test-secret-do-not-use";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    // Minimum bcrypt cost keeps signup fast under test
    config.security.bcrypt_cost = 4;
    config.api.enable_request_logging = false;
    config
}

/// Router over a fresh in-memory store. The store handle is returned so tests
/// can inspect what was written.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    test_app_with(MemoryStore::new(), test_config())
}

pub fn test_app_with(store: MemoryStore, config: AppConfig) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let state = AppState::new(store.clone(), config);
    (app(state), store)
}

/// Token minted directly, skipping signup/signin
pub fn token_for(username: &str) -> String {
    let claims = Claims::new(Uuid::new_v4(), username.to_string(), 1).expect("claims");
    let jwt = generate_jwt(&claims, TEST_SECRET).expect("sign test token");
    format!("JWT {}", jwt)
}

/// Drive one request through the router and decode the JSON reply.
/// An empty reply body decodes as `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    dispatch(app, builder.body(body).expect("build request")).await
}

/// Same as `send`, with an `application/x-www-form-urlencoded` body
pub async fn send_form(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    form: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    dispatch(app, builder.body(Body::from(form.to_string())).expect("build request")).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response is JSON")
    };
    (status, value)
}

pub async fn signup_and_signin(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/signup",
        None,
        Some(json!({ "name": "Test User", "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

    let (status, body) = send(
        app,
        Method::POST,
        "/signin",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signin failed: {}", body);
    body["token"].as_str().expect("token in signin reply").to_string()
}

pub fn movie_payload(title: &str) -> Value {
    json!({
        "title": title,
        "releaseDate": 1999,
        "genre": "Science Fiction",
        "actors": [
            { "actorName": "Keanu Reeves", "characterName": "Neo" },
            { "actorName": "Laurence Fishburne", "characterName": "Morpheus" },
            { "actorName": "Carrie-Anne Moss", "characterName": "Trinity" }
        ],
        "imageUrl": "https://example.com/poster.jpg"
    })
}

/// Create a movie and return its `_id`
pub async fn create_movie(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(app, Method::POST, "/movies", Some(token), Some(movie_payload(title))).await;
    assert_eq!(status, StatusCode::CREATED, "create movie failed: {}", body);
    body["movie"]["_id"].as_str().expect("movie id").to_string()
}

/// Create a review and return its `_id`
pub async fn create_review(app: &Router, token: &str, movie_id: &str, rating: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/review",
        Some(token),
        Some(json!({
            "movieId": movie_id,
            "userName": "critic",
            "review": format!("Worth {} stars", rating),
            "rating": rating
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create review failed: {}", body);
    body["review"]["_id"].as_str().expect("review id").to_string()
}

pub fn short_timeout_config(limit: Duration) -> AppConfig {
    let mut config = test_config();
    config.database.store_timeout_ms = limit.as_millis() as u64;
    config
}
