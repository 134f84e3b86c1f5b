//! HTTP intake integration tests
//!
//! Drives the router against an in-memory tracker.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use triage_server::{
    config::Config,
    server::{create_router, AppState},
};
use triage_tracker::testing::InMemoryTracker;

fn report_body() -> Value {
    json!({
        "application": "hamis-web",
        "stacktrace": [
            {"message": "java.lang.IllegalStateException: berth already assigned", "stacktrace": [
                {"className": "com.acme.berth.BerthPlanner", "methodName": "assign",
                 "fileName": "BerthPlanner.java", "lineNumber": 77, "nativeMethod": false},
                {"className": "com.acme.berth.BerthService", "methodName": "plan",
                 "fileName": "BerthService.java", "lineNumber": 31, "nativeMethod": false}
            ]}
        ]
    })
}

fn app(tracker: Arc<InMemoryTracker>) -> Router {
    let config = Config::default();
    let state = AppState::new(tracker, &config).unwrap();
    create_router(state, &config)
}

fn post_json(body: &Value) -> Request<Body> {
    Request::builder()
        .uri("/")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = app(Arc::new(InMemoryTracker::new()));

    let request = Request::builder()
        .uri("/health")
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_new_then_repeated_report() {
    let tracker = Arc::new(InMemoryTracker::new());
    let app = app(tracker.clone());

    let response = app.clone().oneshot(post_json(&report_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_text(response).await, "Jira issue added: HAMISTIRF-100");

    let response = app.oneshot(post_json(&report_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "Jira issue already exists, updated: HAMISTIRF-100"
    );

    let updates = tracker.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "HAMISTIRF-100");
    assert!(updates[0].1.starts_with("Count: 1\nLast: "));
    assert!(tracker.transitions().is_empty());
}

#[tokio::test]
async fn test_empty_stacktrace_is_bad_request() {
    let tracker = Arc::new(InMemoryTracker::new());
    let app = app(tracker.clone());

    let response = app
        .oneshot(post_json(&json!({"application": "hamis-web", "stacktrace": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(error["error"].is_string());
    assert!(tracker.search_requests().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app(Arc::new(InMemoryTracker::new()));

    let request = Request::builder()
        .uri("/")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"stacktrace\": ["))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_lists_open_issues() {
    let tracker = Arc::new(InMemoryTracker::with_records(vec![
        triage_core::IssueRecord::new("HAMISTIRF-7", "Open"),
        triage_core::IssueRecord::new("HAMISTIRF-9", "In Progress"),
    ]));
    let app = app(tracker.clone());

    let request = Request::builder()
        .uri("/")
        .method(Method::GET)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(page["total"], 2);
    assert_eq!(page["issues"][0]["key"], "HAMISTIRF-7");
    assert_eq!(page["issues"][1]["fields"]["status"]["name"], "In Progress");

    let searches = tracker.search_requests();
    assert_eq!(searches.len(), 1);
    assert_eq!(
        searches[0].jql,
        "project=HAMISTIRF&status in (Open,\"In Progress\",Reopened)&issuetype=Bevinding"
    );
}

#[tokio::test]
async fn test_non_json_post_lists_open_issues() {
    let tracker = Arc::new(InMemoryTracker::new());
    let app = app(tracker.clone());

    let request = Request::builder()
        .uri("/")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(page["total"], 0);
    assert!(tracker.created().is_empty());
}

#[tokio::test]
async fn test_tracker_failure_is_bad_gateway() {
    let tracker = Arc::new(InMemoryTracker::new().fail_search_at(0, 503));
    let app = app(tracker.clone());

    let response = app.oneshot(post_json(&report_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(tracker.created().is_empty());
}

#[tokio::test]
async fn test_write_failure_is_bad_gateway() {
    let tracker = Arc::new(InMemoryTracker::new().fail_writes(400));
    let app = app(tracker);

    let response = app.oneshot(post_json(&report_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = Config::default();
    config.server.max_body_bytes = 64;
    let tracker = Arc::new(InMemoryTracker::new());
    let state = AppState::new(tracker.clone(), &config).unwrap();
    let app = create_router(state, &config);

    let body = report_body().to_string();
    let request = Request::builder()
        .uri("/")
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(tracker.search_requests().is_empty());
}
