mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use common::TestApp;
use inkwell::{routes::build_router, utils::middleware::USER_ID_HEADER};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_check_responds() {
    let app = TestApp::new().await;
    let router = build_router(app.state.clone());

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn user_creation_and_username_checks() {
    let app = TestApp::new().await;
    let router = build_router(app.state.clone());

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/inkwell/users",
        None,
        Some(json!({ "id": "ada", "name": "Ada Lovelace", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], "ada");
    assert!(body["data"]["username"].as_str().unwrap().starts_with("ada-"));

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/inkwell/users/username-availability?username=admin",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], false);
    assert_eq!(body["data"]["available"], false);

    let (_, body) = send(
        &router,
        Method::GET,
        "/api/inkwell/users/username-availability?username=john_doe-1",
        None,
        None,
    )
    .await;
    assert_eq!(body["data"]["valid"], true);
    assert_eq!(body["data"]["available"], true);

    let (status, _) = send(&router, Method::GET, "/api/inkwell/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update_recomputes_completion() {
    let app = TestApp::new().await;
    app.user("ada", "Ada").await;
    let router = build_router(app.state.clone());

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/inkwell/users/me",
        Some("ada"),
        Some(json!({ "first_name": "Ada", "last_name": "Lovelace", "country": "UK" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile_completion_percentage"], 35);
    assert_eq!(body["data"]["profile_complete"], false);

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/inkwell/users/me",
        Some("ada"),
        Some(json!({ "website": "", "photo_url": null, "country": "UK" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile_completion_percentage"], 35);

    let (status, _) = send(
        &router,
        Method::PUT,
        "/api/inkwell/users/me",
        Some("ada"),
        Some(json!({ "username": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn follow_endpoints_map_errors_to_statuses() {
    let app = TestApp::new().await;
    app.user("a", "Ada").await;
    app.user("b", "Bob").await;
    let router = build_router(app.state.clone());

    let uri = "/api/inkwell/follows/user/b/follow";
    let (status, _) = send(&router, Method::POST, uri, Some("a"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, Method::POST, uri, Some("a"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&router, Method::POST, "/api/inkwell/follows/user/a/follow", Some("a"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::POST, uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&router, Method::GET, "/api/inkwell/follows/user/b/stats", Some("a"), None).await;
    assert_eq!(body["data"]["followers_count"], 1);
    assert_eq!(body["data"]["is_following"], true);

    let (_, body) = send(&router, Method::GET, "/api/inkwell/follows/user/b/followers", None, None).await;
    assert_eq!(body["data"][0]["id"], "a");

    let (_, body) = send(&router, Method::GET, "/api/inkwell/notifications/unread-count", Some("b"), None).await;
    assert_eq!(body["data"]["unread_count"], 1);

    let (status, _) = send(&router, Method::DELETE, uri, Some("a"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&router, Method::DELETE, uri, Some("a"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn toggle_and_status_through_http() {
    let app = TestApp::new().await;
    app.user("writer", "Writer").await;
    app.user("reader", "Reader").await;
    let post = app.publish("writer", "Hello").await;
    let router = build_router(app.state.clone());

    let toggle = format!("/api/inkwell/engagement/posts/{}/toggle/like", post.id);
    let (status, body) = send(&router, Method::POST, &toggle, Some("reader"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active"], true);

    let reading = format!("/api/inkwell/engagement/reading-list/{}", post.id);
    let (_, body) = send(&router, Method::POST, &reading, Some("reader"), None).await;
    assert_eq!(body["data"]["in_reading_list"], true);

    let status_uri = format!("/api/inkwell/engagement/posts/{}/status", post.id);
    let (_, body) = send(&router, Method::GET, &status_uri, Some("reader"), None).await;
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["bookmarked"], false);
    assert_eq!(body["data"]["in_reading_list"], true);

    let bad_kind = format!("/api/inkwell/engagement/posts/{}/toggle/clap", post.id);
    let (status, _) = send(&router, Method::POST, &bad_kind, Some("reader"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let comments = format!("/api/inkwell/engagement/posts/{}/comment-count", post.id);
    let (status, body) = send(&router, Method::POST, &comments, Some("reader"), Some(json!({ "delta": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["comment_count"], 1);
    let (status, _) = send(&router, Method::POST, &comments, Some("reader"), Some(json!({ "delta": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for _ in 0..2 {
        send(&router, Method::POST, &comments, Some("reader"), Some(json!({ "delta": -1 }))).await;
    }

    let (_, body) = send(&router, Method::GET, &format!("/api/inkwell/posts/{}", post.id), None, None).await;
    assert_eq!(body["data"]["like_count"], 1);
    assert_eq!(body["data"]["comment_count"], 0);
}

#[tokio::test]
async fn drafts_are_only_visible_to_their_author() {
    let app = TestApp::new().await;
    app.user("writer", "Writer").await;
    let router = build_router(app.state.clone());

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/inkwell/posts",
        Some("writer"),
        Some(json!({ "title": "Draft", "content": "Not yet", "save_as_draft": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_uri = format!("/api/inkwell/posts/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = send(&router, Method::GET, &post_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&router, Method::GET, &post_uri, Some("someone"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&router, Method::GET, &post_uri, Some("writer"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "draft");
}

#[tokio::test]
async fn recommendations_degrade_to_empty_list() {
    let app = TestApp::new().await;
    app.user("writer", "Writer").await;
    let post = app.publish("writer", "Hello").await;
    let router = build_router(app.state.clone());

    let (status, body) = send(
        &router,
        Method::GET,
        &format!("/api/inkwell/recommendations/similar/{}", post.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn feed_and_search_routes() {
    let app = TestApp::new().await;
    app.user("writer", "Writer").await;
    app.publish("writer", "Rust ownership explained").await;
    let router = build_router(app.state.clone());

    let (status, body) = send(&router, Method::GET, "/api/inkwell/feed/featured?limit=5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["count"], 1);

    let (status, _) = send(&router, Method::GET, "/api/inkwell/feed/for-you", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&router, Method::GET, "/api/inkwell/search?q=rust", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["articles"].as_array().unwrap().len(), 1);

    let (_, body) = send(&router, Method::GET, "/api/inkwell/search/categories", None, None).await;
    assert!(!body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn analytics_and_notification_deletion_routes() {
    let app = TestApp::new().await;
    app.user("writer", "Writer").await;
    app.user("reader", "Reader").await;
    let post = app.publish("writer", "Hello").await;
    app.state.engagement_service.record_view(&post.id).await.unwrap();
    let router = build_router(app.state.clone());

    let (status, _) = send(&router, Method::GET, "/api/inkwell/analytics/overview", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&router, Method::GET, "/api/inkwell/analytics/overview", Some("writer"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_articles"], 1);
    assert_eq!(body["data"]["total_views"], 1);

    let stats_uri = format!("/api/inkwell/analytics/articles/{}", post.id);
    let (status, body) = send(&router, Method::GET, &stats_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["views"], 1);

    send(&router, Method::POST, "/api/inkwell/follows/user/writer/follow", Some("reader"), None).await;
    let (_, body) = send(&router, Method::GET, "/api/inkwell/notifications", Some("writer"), None).await;
    let notification_uri = format!(
        "/api/inkwell/notifications/{}",
        body["data"][0]["id"].as_str().unwrap()
    );

    let (status, _) = send(&router, Method::DELETE, &notification_uri, Some("reader"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&router, Method::DELETE, &notification_uri, Some("writer"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, Method::GET, "/api/inkwell/notifications", Some("writer"), None).await;
    assert_eq!(body["data"], json!([]));
    let (_, body) = send(&router, Method::GET, "/api/inkwell/notifications/unread-count", Some("writer"), None).await;
    assert_eq!(body["data"]["unread_count"], 0);
}
