//! JSON API behaviour through the full router, backed by the in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use quill_server::http::{build_router, AppState, ServerConfig};
use quill_server::{BlogSettings, MemoryStore};

fn app(admin_enabled: bool) -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), BlogSettings::default());
    let config = ServerConfig {
        admin_enabled,
        ..ServerConfig::default()
    };
    build_router(state, &config)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Seed an author, a category and one published post through the admin API.
async fn seed(app: &Router) -> Value {
    let (status, author) = send(
        app,
        Method::POST,
        "/admin/authors",
        Some(json!({"username": "editor", "display_name": "Editor"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, category) = send(
        app,
        Method::POST,
        "/admin/categories",
        Some(json!({"name": "Rust"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, post) = send(
        app,
        Method::POST,
        "/admin/posts",
        Some(json!({
            "title": "Hello World",
            "author_id": author["id"],
            "body": "x".repeat(200),
            "status": "published",
            "categories": [category["id"]],
            "tags": ["Rust", "rust"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    post
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(&app(false), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn admin_routes_absent_unless_enabled() {
    let (status, _) = send(&app(false), Method::GET, "/admin/posts", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn created_post_has_derived_slug_and_summary() {
    let app = app(true);
    let post = seed(&app).await;

    assert_eq!(post["slug"], "hello-world");
    assert_eq!(post["meta_description"], format!("{}...", "x".repeat(150)));
    assert_eq!(post["tags"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn index_lists_published_with_pagination() {
    let app = app(true);
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/posts?search=HELLO&page=junk", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"][0]["slug"], "hello-world");
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["per_page"], 6);
    assert_eq!(body["search_query"], "HELLO");
    assert_eq!(body["categories"][0]["name"], "Rust");
}

#[tokio::test]
async fn detail_counts_views() {
    let app = app(true);
    seed(&app).await;

    send(&app, Method::GET, "/posts/hello-world", None).await;
    let (status, body) = send(&app, Method::GET, "/posts/hello-world", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["views"], 2);
}

#[tokio::test]
async fn draft_detail_is_404() {
    let app = app(true);
    let post = seed(&app).await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/admin/posts/{}", post["id"]),
        Some(json!({"status": "draft"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/posts/hello-world", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn comment_submission_reports_field_errors() {
    let app = app(true);
    seed(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/posts/hello-world/comments",
        Some(json!({"name": "Al", "email": "al@example.com", "body": "short"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"]["name"][0], "Name must be at least 3 characters.");
    assert_eq!(body["fields"]["body"][0], "Comment must be at least 10 characters.");
}

#[tokio::test]
async fn comment_moderation_round_trip() {
    let app = app(true);
    seed(&app).await;

    let (status, comment) = send(
        &app,
        Method::POST,
        "/posts/hello-world/comments",
        Some(json!({"name": "Alice", "email": "alice@example.com", "body": "Great introduction!"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(comment.get("email").is_none());

    let (_, result) = send(
        &app,
        Method::POST,
        "/admin/comments/deactivate",
        Some(json!({"ids": [comment["id"]]})),
    )
    .await;
    assert_eq!(result["updated"], 1);

    let (_, detail) = send(&app, Method::GET, "/posts/hello-world", None).await;
    assert_eq!(detail["comments"].as_array().map(Vec::len), Some(0));

    let (_, pending) = send(&app, Method::GET, "/admin/comments?active=false", None).await;
    assert_eq!(pending[0]["id"], comment["id"]);

    send(
        &app,
        Method::POST,
        "/admin/comments/approve",
        Some(json!({"ids": [comment["id"]]})),
    )
    .await;
    let (_, detail) = send(&app, Method::GET, "/posts/hello-world", None).await;
    assert_eq!(detail["comments"][0]["name"], "Alice");
}

#[tokio::test]
async fn duplicate_slug_is_409() {
    let app = app(true);
    let post = seed(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/admin/posts",
        Some(json!({
            "title": "Hello World",
            "author_id": post["author"]["id"],
            "body": "another body"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn category_page_and_unknown_category() {
    let app = app(true);
    seed(&app).await;

    let (status, body) = send(&app, Method::GET, "/categories/Rust", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["name"], "Rust");
    assert_eq!(body["posts"][0]["slug"], "hello-world");

    let (status, _) = send(&app, Method::GET, "/categories/Missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_post_removes_it() {
    let app = app(true);
    let post = seed(&app).await;
    let uri = format!("/admin/posts/{}", post["id"]);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_author_takes_their_posts() {
    let app = app(true);
    let post = seed(&app).await;
    let author_uri = format!("/admin/authors/{}", post["author"]["id"]);

    let (status, _) = send(&app, Method::DELETE, &author_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/posts/hello-world", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &author_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_400() {
    let (status, body) = send(&app(true), Method::GET, "/admin/posts/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["id"][0], "id: must be a positive integer");
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = app(true);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin/categories")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
