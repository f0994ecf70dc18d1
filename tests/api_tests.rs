//! HTTP API integration tests
//! Drives the REST endpoints over a real listener with in-memory stores
//!
//! Run with: cargo test --test api_tests -- --nocapture

use merchant_auth::api::{build_state, serve};
use merchant_auth::config::Config;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Start the API on an ephemeral port and return its base URL
async fn start_test_server(configure: impl FnOnce(&mut Config)) -> (String, tokio::task::JoinHandle<()>) {
    let mut config = Config::default();
    config.auth.jwt_secret = "api-test-signing-key".to_string();
    config.auth.bcrypt_cost = 4;
    configure(&mut config);

    let state = build_state(config).await.expect("Failed to build state");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let _ = serve(listener, state).await;
    });

    (format!("http://{}", addr), handle)
}

async fn register_and_login(client: &reqwest::Client, base: &str) -> Value {
    let response = client
        .post(format!("{}/auth/register", base))
        .json(&json!({
            "email": "a@x.com",
            "password": "correct",
            "name": "Alice",
            "merchant_id": 42
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/auth/login", base))
        .json(&json!({ "email": "a@x.com", "password": "correct" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_health_reports_sessions() {
    let (base, handle) = start_test_server(|_| {}).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], true);

    handle.abort();
}

#[tokio::test]
async fn test_login_flow() {
    let (base, handle) = start_test_server(|_| {}).await;
    let client = reqwest::Client::new();

    let login = register_and_login(&client, &base).await;
    assert_eq!(login["role"], "merchant");
    assert_eq!(login["merchant_id"], 42);
    assert_eq!(login["email"], "a@x.com");
    assert!(login["session_id"].as_str().is_some_and(|s| s.len() == 64));
    assert!(login["access_token"].as_str().is_some_and(|s| !s.is_empty()));

    let me: Value = client
        .get(format!("{}/auth/me", base))
        .bearer_auth(login["access_token"].as_str().unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "merchant");

    handle.abort();
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let (base, handle) = start_test_server(|_| {}).await;
    let client = reqwest::Client::new();
    register_and_login(&client, &base).await;

    let response = client
        .post(format!("{}/auth/login", base))
        .json(&json!({ "email": "a@x.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");

    handle.abort();
}

#[tokio::test]
async fn test_register_conflict_and_validation() {
    let (base, handle) = start_test_server(|_| {}).await;
    let client = reqwest::Client::new();
    register_and_login(&client, &base).await;

    let duplicate = client
        .post(format!("{}/auth/register", base))
        .json(&json!({ "email": "a@x.com", "password": "x", "name": "Again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), 409);

    let empty = client
        .post(format!("{}/auth/register", base))
        .json(&json!({ "email": "", "password": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 400);

    handle.abort();
}

#[tokio::test]
async fn test_refresh_endpoint() {
    let (base, handle) = start_test_server(|_| {}).await;
    let client = reqwest::Client::new();
    let login = register_and_login(&client, &base).await;

    let ok = client
        .post(format!("{}/auth/refresh", base))
        .json(&json!({ "refresh_token": login["refresh_token"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 200);
    let body: Value = ok.json().await.unwrap();
    assert!(body["access_token"].as_str().is_some_and(|s| !s.is_empty()));

    let denied = client
        .post(format!("{}/auth/refresh", base))
        .json(&json!({ "refresh_token": login["access_token"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 401);
    let body: Value = denied.json().await.unwrap();
    assert_eq!(body["access_token"], "");
    assert_eq!(body["refresh_token"], "");

    handle.abort();
}

#[tokio::test]
async fn test_session_validate_refresh_and_logout() {
    let (base, handle) = start_test_server(|_| {}).await;
    let client = reqwest::Client::new();
    let login = register_and_login(&client, &base).await;
    let session_id = login["session_id"].as_str().unwrap().to_string();

    let valid: Value = client
        .post(format!("{}/auth/session/validate", base))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(valid["valid"], true);
    assert_eq!(valid["merchant_id"], 42);
    assert_eq!(valid["email"], "a@x.com");

    let refreshed = client
        .post(format!("{}/auth/session/refresh", base))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(refreshed.status(), 200);

    let logout: Value = client
        .post(format!("{}/auth/logout", base))
        .header("X-Session-ID", &session_id)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(logout["status"], "logged_out");

    let invalid: Value = client
        .post(format!("{}/auth/session/validate", base))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(invalid, json!({ "valid": false }));

    let missing = client
        .post(format!("{}/auth/session/refresh", base))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    handle.abort();
}

#[tokio::test]
async fn test_sessions_disabled() {
    let (base, handle) = start_test_server(|config| config.session.enabled = false).await;
    let client = reqwest::Client::new();
    let login = register_and_login(&client, &base).await;
    assert!(login.get("session_id").is_none());

    let response = client
        .post(format!("{}/auth/session/validate", base))
        .json(&json!({ "session_id": "anything" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);

    let logout = client
        .post(format!("{}/auth/logout", base))
        .json(&json!({ "session_id": "anything" }))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), 200);

    handle.abort();
}

#[tokio::test]
async fn test_me_requires_access_token() {
    let (base, handle) = start_test_server(|_| {}).await;
    let client = reqwest::Client::new();
    let login = register_and_login(&client, &base).await;

    let missing = client.get(format!("{}/auth/me", base)).send().await.unwrap();
    assert_eq!(missing.status(), 401);

    let with_refresh = client
        .get(format!("{}/auth/me", base))
        .bearer_auth(login["refresh_token"].as_str().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(with_refresh.status(), 401);

    handle.abort();
}

#[tokio::test]
async fn test_server_refuses_to_start_without_real_secret() {
    assert!(matches!(
        build_state(Config::default()).await,
        Err(merchant_auth::Error::Config(_))
    ));

    let mut config = Config::default();
    config.auth.jwt_secret = "change-me".to_string();
    assert!(matches!(
        build_state(config).await,
        Err(merchant_auth::Error::Config(_))
    ));
}
