//! End-to-end tests for the gatekeeping chain over real HTTP.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::PASSWORD;

#[tokio::test]
async fn test_login_returns_token_with_stored_role() {
    let server = common::start(common::config_with_staff()).await;

    let res = server.login("mia", PASSWORD).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 86_400);
    assert_eq!(body["user"]["role"], "manager");

    let token = body["token"].as_str().unwrap();
    let me: Value = server
        .client
        .get(server.url("/api/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["role"], "manager");
    assert_eq!(me["name"], "Mia Manager");
    assert_eq!(me["iss"], "restaurant-gatekeeper");
}

#[tokio::test]
async fn test_bad_credentials_look_the_same() {
    let server = common::start(common::config_with_staff()).await;

    let wrong_password: Value = server.login("sam", "guess").await.json().await.unwrap();
    let unknown_user: Value = server.login("nobody", PASSWORD).await.json().await.unwrap();
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["code"], "invalid_credentials");
}

#[tokio::test]
async fn test_eleventh_login_is_rate_limited() {
    let server = common::start(common::config_with_staff()).await;

    for i in 0..10 {
        let res = server.login("sam", "wrong").await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "attempt {i}");
    }

    let res = server.login("sam", PASSWORD).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let header: u64 = res.headers()["retry-after"].to_str().unwrap().parse().unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "rate_limited");
    assert_eq!(body["retry_after"], header);
    assert!(header > 0 && header <= 60);
}

#[tokio::test]
async fn test_token_problems_are_401() {
    let server = common::start(common::config_with_staff()).await;

    let res = server.client.get(server.url("/api/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "missing_token");

    let res = server
        .client
        .get(server.url("/api/me"))
        .header("authorization", "Basic Zm9vOmJhcg==")
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "malformed_token");

    let token = format!("{}x", server.token("carol").await);
    let res = server.client.get(server.url("/api/me")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "malformed_token");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let mut config = common::config_with_staff();
    config.auth.token_ttl_secs = 1;
    let server = common::start(config).await;

    let token = server.token("carol").await;
    tokio::time::sleep(Duration::from_millis(2_100)).await;

    let res = server.client.get(server.url("/api/me")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "expired_token");
}

#[tokio::test]
async fn test_role_hierarchy() {
    let server = common::start(common::config_with_staff()).await;

    let cases = [
        ("carol", "/api/reports/summary", StatusCode::FORBIDDEN),
        ("sam", "/api/reports/summary", StatusCode::FORBIDDEN),
        ("mia", "/api/reports/summary", StatusCode::OK),
        ("dora", "/api/reports/summary", StatusCode::OK),
        ("mia", "/admin/status", StatusCode::FORBIDDEN),
        ("dora", "/admin/status", StatusCode::OK),
        ("carol", "/api/me", StatusCode::OK),
    ];

    for (user, path, expected) in cases {
        let token = server.token(user).await;
        let res = server.client.get(server.url(path)).bearer_auth(&token).send().await.unwrap();
        assert_eq!(res.status(), expected, "{user} -> {path}");
        if expected == StatusCode::FORBIDDEN {
            let body: Value = res.json().await.unwrap();
            assert_eq!(body["code"], "insufficient_role");
        }
    }
}

#[tokio::test]
async fn test_reservation_reports_every_violation() {
    let server = common::start(common::config_with_staff()).await;
    let token = server.token("carol").await;

    let res = server
        .client
        .post(server.url("/api/reservations"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Ada",
            "phone": "call me",
            "party_size": 0,
            "date": "2026-11-02",
            "time": "25:00",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "validation_failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["phone", "party_size", "time"]);
}

#[tokio::test]
async fn test_reservation_is_sanitized() {
    let server = common::start(common::config_with_staff()).await;
    let token = server.token("sam").await;

    let res = server
        .client
        .post(server.url("/api/reservations"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "  <script>alert('x')</script>Ada  ",
            "phone": "+1 555 0100",
            "party_size": 4,
            "date": "2026-11-02",
            "time": "19:30",
            "seating": "outdoor",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reservation"]["name"], "alert(x)Ada");
    assert_eq!(body["reservation"]["seating"], "outdoor");
    assert_eq!(body["status"], "received");
    assert!(!body["requested_by"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_and_health() {
    let server = common::start(common::config_with_staff()).await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let token = server.token("carol").await;
    let res = server.client.post(server.url("/auth/logout")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = common::config_with_staff();
    config.security.max_body_size = 256;
    let server = common::start(config).await;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "sam", "password": "x".repeat(1_024) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
