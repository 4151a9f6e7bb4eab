//! Shared utilities for integration tests.

use std::net::SocketAddr;

use restaurant_gatekeeper::config::{DeploymentMode, GatekeeperConfig, SigningSecret, UserRecord};
use restaurant_gatekeeper::http::HttpServer;
use restaurant_gatekeeper::lifecycle::Shutdown;
use restaurant_gatekeeper::security::PasswordHasher;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse <battery>";

/// A running gatekeeper on an ephemeral port.
pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Log in as `username` and return the bearer token.
    pub async fn token(&self, username: &str) -> String {
        let res = self.login(username, PASSWORD).await;
        assert_eq!(res.status(), 200, "login as {username}");
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// One user per default role, all sharing [`PASSWORD`]. Cheap Argon2
/// parameters keep the suite fast; verification reads them from the digest.
pub fn config_with_staff() -> GatekeeperConfig {
    let hasher = PasswordHasher::with_params(1024, 1, 1).unwrap();
    let mut config = GatekeeperConfig::default();
    for (username, display_name, role) in [
        ("carol", "Carol Customer", "customer"),
        ("sam", "Sam Server", "staff"),
        ("mia", "Mia Manager", "manager"),
        ("dora", "Dora Director", "director"),
    ] {
        config.users.push(UserRecord {
            id: Uuid::new_v4(),
            username: username.into(),
            display_name: display_name.into(),
            role: role.into(),
            password_hash: hasher.hash(PASSWORD).unwrap(),
        });
    }
    config
}

pub async fn start(config: GatekeeperConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    let server = HttpServer::new(
        config,
        DeploymentMode::Development,
        &SigningSecret::new("integration-test-signing-secret!"),
    );
    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });

    TestServer {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        shutdown,
    }
}
