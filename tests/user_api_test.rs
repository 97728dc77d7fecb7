//! End-to-end router tests: endpoint behavior, JSON binding, and the
//! metrics recorded by the interception middleware.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;
use usermon::api::{ApiServer, AppState, MsgResponse, UserListResponse};
use usermon::config::UserConfig;
use usermon::exporter::{MetricsExporter, UNKNOWN_ENDPOINT};
use usermon::store::UserStore;

fn create_test_state() -> AppState {
    AppState {
        store: Arc::new(UserStore::new()),
        exporter: Arc::new(MetricsExporter::new().unwrap()),
    }
}

fn create_test_server(state: AppState) -> ApiServer {
    let bind_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    ApiServer::new(bind_addr, state)
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn register_then_login_records_business_events() {
    let state = create_test_state();
    let server = create_test_server(state.clone());

    let response = server
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/register",
            r#"{"username":"alice","password":"secret"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.exporter.get_business_event_count("register", "alice"), 1);

    let response = server
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/login",
            r#"{"username":"alice","password":"secret"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: MsgResponse = body_json(response).await;
    assert!(body.message.contains("alice"));

    assert_eq!(state.exporter.get_business_event_count("login", "alice"), 1);
    assert_eq!(state.exporter.get_business_event_count("login", "bob"), 0);
}

#[tokio::test]
async fn middleware_records_route_pattern_and_status() {
    let state = create_test_state();
    let server = create_test_server(state.clone());

    let response = server
        .router()
        .oneshot(json_request(
            "POST",
            "/api/v1/login",
            r#"{"username":"ghost","password":"nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(
        state
            .exporter
            .get_http_request_count(400, "POST", "/api/v1/login"),
        1
    );
    assert_eq!(
        state
            .exporter
            .get_http_duration_samples(400, "POST", "/api/v1/login"),
        1
    );
}

#[tokio::test]
async fn malformed_json_yields_422_and_is_still_observed() {
    let state = create_test_state();
    let server = create_test_server(state.clone());

    let response = server
        .router()
        .oneshot(json_request("POST", "/api/v1/register", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(
        state
            .exporter
            .get_http_request_count(422, "POST", "/api/v1/register"),
        1
    );
    // No business event for a request that never bound.
    assert_eq!(state.exporter.get_business_event_count("register", ""), 0);
}

#[tokio::test]
async fn users_listing_returns_seeded_users() {
    let state = create_test_state();
    state.store.load_from_config(&[
        UserConfig {
            username: "alice".to_string(),
            password: "secret".to_string(),
        },
        UserConfig {
            username: "bob".to_string(),
            password: "hunter2".to_string(),
        },
    ]);
    let server = create_test_server(state.clone());

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/users")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: UserListResponse = body_json(response).await;
    assert_eq!(body.data, vec!["alice", "bob"]);

    assert_eq!(
        state
            .exporter
            .get_business_event_count("get_users", "system"),
        1
    );
    assert_eq!(
        state
            .exporter
            .get_http_request_count(200, "GET", "/api/v1/users"),
        1
    );
}

#[tokio::test]
async fn empty_user_table_lists_as_200_with_no_entries() {
    let state = create_test_state();
    let server = create_test_server(state);

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/users")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: UserListResponse = body_json(response).await;
    assert!(body.data.is_empty());
}

#[tokio::test]
async fn unmatched_route_is_observed_under_unknown() {
    let state = create_test_state();
    let server = create_test_server(state.clone());

    let request = Request::builder()
        .method("GET")
        .uri("/definitely/not/a/route")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        state
            .exporter
            .get_http_request_count(404, "GET", UNKNOWN_ENDPOINT),
        1
    );
}

#[tokio::test]
async fn duplicate_registration_is_rejected_with_400() {
    let state = create_test_state();
    let server = create_test_server(state.clone());

    let payload = r#"{"username":"carol","password":"pw"}"#;
    let response = server
        .router()
        .oneshot(json_request("POST", "/api/v1/register", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .router()
        .oneshot(json_request("POST", "/api/v1/register", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Only the successful attempt counted as a business event.
    assert_eq!(
        state.exporter.get_business_event_count("register", "carol"),
        1
    );
}
