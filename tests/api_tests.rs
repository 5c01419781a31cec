//! API integration tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wagate::client::ClientEvent;
use wagate::session::models::SessionStatus;

mod common;
use common::{test_app, test_app_with_key, TestApp, TEST_API_KEY};

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("request failed");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("x-api-key", TEST_API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-api-key", TEST_API_KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn start_and_connect(app: &TestApp, id: &str) {
    let (status, _) = send(app, get(&format!("/session/start/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    app.emit(id, ClientEvent::Ready).await;
    app.eventually(|| {
        app.registry
            .status(id)
            .map(|s| s.status == SessionStatus::Connected)
            .unwrap_or(false)
    })
    .await;
}

#[tokio::test]
async fn test_ping_requires_no_auth() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/ping")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("pong"));
}

#[tokio::test]
async fn test_session_routes_reject_missing_api_key() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/session/start/alpha")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_session_routes_open_without_configured_key() {
    let app = test_app_with_key(None).await;
    let request = Request::builder()
        .uri("/session/start/alpha")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_login_and_bearer_access() {
    let app = test_app().await;

    let creds = json!({ "email": "user@example.com", "password": "hunter22" });
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(creds.to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert!(body["token"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(creds.to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    // A valid bearer token passes the protected routes without the key.
    let request = Request::builder()
        .uri("/session/start/alpha")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = test_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "user@example.com", "password": "hunter22" }).to_string(),
        ))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "user@example.com", "password": "wrong" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_session_start_and_status() {
    let app = test_app().await;

    let (status, body) = send(&app, get("/session/start/alpha")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Session initiated successfully"));
    assert_eq!(body["state"], json!("STARTING"));

    let (status, body) = send(&app, get("/session/status/alpha")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], json!("STARTING"));
    assert_eq!(body["qrAvailable"], json!(false));
}

#[tokio::test]
async fn test_status_of_unknown_session_is_not_found() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/session/status/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_malformed_session_name_is_unprocessable() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/session/start/bad%20name")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_qr_flow() {
    let app = test_app().await;
    send(&app, get("/session/start/alpha")).await;

    // No QR until the engine has published one.
    let (status, _) = send(&app, get("/session/qr/alpha")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.emit(
        "alpha",
        ClientEvent::Qr {
            payload: "1@pairing-payload".to_string(),
        },
    )
    .await;
    app.eventually(|| {
        app.registry
            .status("alpha")
            .map(|s| s.qr_available)
            .unwrap_or(false)
    })
    .await;

    let (status, body) = send(&app, get("/session/qr/alpha")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["qr"], json!("1@pairing-payload"));

    let response = app
        .router
        .clone()
        .oneshot(get("/session/qr/alpha/image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..4], b"\x89PNG");

    // Scanning consumes the QR.
    app.emit("alpha", ClientEvent::Authenticated).await;
    app.eventually(|| {
        app.registry
            .status("alpha")
            .map(|s| !s.qr_available)
            .unwrap_or(false)
    })
    .await;
    let (status, _) = send(&app, get("/session/qr/alpha")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_terminate_is_idempotent() {
    let app = test_app().await;
    send(&app, get("/session/start/alpha")).await;

    let (status, body) = send(&app, get("/session/terminate/alpha")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Logged out successfully"));

    // Terminating an absent session still reports success.
    let (status, _) = send(&app, get("/session/terminate/alpha")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_client_route_conflicts_before_ready() {
    let app = test_app().await;
    send(&app, get("/session/start/alpha")).await;

    let (status, body) = send(&app, get("/client/getChats/alpha")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_client_route_after_ready() {
    let app = test_app().await;
    start_and_connect(&app, "alpha").await;

    let (status, body) = send(&app, get("/client/getChats/alpha")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["chats"], json!({ "mock": true }));
}

#[tokio::test]
async fn test_send_message() {
    let app = test_app().await;
    start_and_connect(&app, "alpha").await;

    let (status, body) = send(
        &app,
        post_json(
            "/client/sendMessage/alpha",
            json!({
                "chatId": "123@c.us",
                "contentType": "string",
                "content": "hello"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!({ "mock": true }));
}

#[tokio::test]
async fn test_send_message_accepts_original_content_type_names() {
    let app = test_app().await;
    start_and_connect(&app, "alpha").await;

    let (status, _) = send(
        &app,
        post_json(
            "/client/sendMessage/alpha",
            json!({
                "chatId": "123@c.us",
                "contentType": "MessageMediaFromURL",
                "content": "https://example.com/cat.png"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_group_and_contact_routes() {
    let app = test_app().await;
    start_and_connect(&app, "alpha").await;

    let (status, body) = send(
        &app,
        post_json(
            "/groupChat/getInviteCode/alpha",
            json!({ "chatId": "456@g.us" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inviteCode"], json!({ "mock": true }));

    let (status, body) = send(
        &app,
        post_json("/contact/getAbout/alpha", json!({ "contactId": "123@c.us" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["about"], json!({ "mock": true }));
}

#[tokio::test]
async fn test_api_docs_served_when_enabled() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/api-docs")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openapi"], json!("3.0.0"));
}
