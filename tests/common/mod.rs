#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use secrecy::Secret;
use std::{env, sync::Arc, time::Duration};
use svcprobe::{
    config::{ConnectionConfig, ServiceMetadata},
    probe::DEFAULT_TIMEOUT_MS,
    server::{AppState, router},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

pub const MARIADB_HOST: &str = "127.0.0.1";
pub const MARIADB_PORT: u16 = 3306;
pub const MARIADB_USER: &str = "svcprobe";
pub const MARIADB_PASSWORD: &str = "secret";
pub const MARIADB_DATABASE: &str = "testdb";

pub fn skip_if_no_mariadb() -> bool {
    env::var("SKIP_MARIADB_TESTS").is_ok()
}

pub fn pick_free_port() -> u16 {
    std::net::TcpListener::bind(("127.0.0.1", 0))
        .expect("failed to bind random local port")
        .local_addr()
        .expect("failed to read local addr")
        .port()
}

pub fn metadata(feature_new_ui: bool) -> ServiceMetadata {
    ServiceMetadata::new("1.4.2".to_string(), "0123abcd".to_string(), feature_new_ui)
}

pub fn db_config(host: &str, port: u16, user: &str, password: &str) -> ConnectionConfig {
    ConnectionConfig {
        host: host.to_string(),
        port,
        user: user.to_string(),
        password: Secret::new(password.to_string()),
        database: MARIADB_DATABASE.to_string(),
        use_encrypted_transport: false,
        ssl_ca: None,
    }
}

pub fn mariadb_config() -> ConnectionConfig {
    db_config(MARIADB_HOST, MARIADB_PORT, MARIADB_USER, MARIADB_PASSWORD)
}

pub fn app_state(db: Option<ConnectionConfig>) -> AppState {
    AppState {
        metadata: metadata(false),
        db: db.map(Arc::new),
        probe_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
    }
}

/// Serve the router on an ephemeral port, returns the port
pub async fn spawn_server(state: AppState) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let port = listener.local_addr().expect("failed to read local addr").port();
    let app = router(Arc::new(state));
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("test server failed");
    });
    port
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: String,
    pub body: String,
}

impl HttpResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("invalid JSON body {:?}: {e}", self.body))
    }
}

pub async fn http_get(port: u16, path: &str) -> Option<HttpResponse> {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.ok()?;
    let request =
        format!("GET {path} HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.ok()?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.ok()?;
    let response = String::from_utf8(response).ok()?;
    let (head, body) = response.split_once("\r\n\r\n")?;
    let status = head.split_whitespace().nth(1)?.parse::<u16>().ok()?;
    Some(HttpResponse {
        status,
        headers: head.to_lowercase(),
        body: body.to_string(),
    })
}
