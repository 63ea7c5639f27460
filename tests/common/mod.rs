//! Test harness for HTTP integration tests.
//!
//! Provides a `TestServer` that runs the real router on an ephemeral port over a
//! temporary storage root, plus small helpers for local upstream stubs.

#![allow(dead_code)]

use axum::Router;
use reqwest::{Client, Method, RequestBuilder, redirect};
use std::path::{Path, PathBuf};
use stl_hub::auth::SessionKeys;
use stl_hub::storage::UserSummary;
use stl_hub::{Server, ServerConfig};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";

/// Running server with automatic shutdown.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    keys: SessionKeys,
    storage: TempDir,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Start with test defaults, then let the caller adjust the configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let storage = TempDir::new().expect("create storage dir");

        let mut config = ServerConfig::default();
        config.server.bind_address = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.storage_root = storage.path().join("files").to_string_lossy().into_owned();
        config.server.static_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("static")
            .to_string_lossy()
            .into_owned();
        config.auth.secret_key = TEST_SECRET.to_string();
        adjust(&mut config);

        let keys = SessionKeys::new(&config.auth.secret_key, config.auth.token_lifetime());
        let server = Server::new(config).await.expect("server starts");
        let addr = server.local_addr().expect("bound address");
        let handle = tokio::spawn(async move {
            if let Err(e) = server.start().await {
                eprintln!("test server stopped: {e}");
            }
        });

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .expect("http client");

        Self {
            base_url: format!("http://{addr}"),
            client,
            keys,
            storage,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage.path().join("files")
    }

    /// `Cookie` header value for a signed-in user.
    pub fn cookie_for(&self, email: &str) -> String {
        let user = UserSummary {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            picture: String::new(),
        };
        format!("session_token={}", self.keys.issue(&user).expect("issue token"))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Request carrying the session cookie of `email`.
    pub fn as_user(&self, email: &str, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path)
            .header(reqwest::header::COOKIE, self.cookie_for(email))
    }

    pub async fn upload(
        &self,
        email: &str,
        dir: &str,
        name: &str,
        content: &[u8],
    ) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name(name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("path", dir.to_string())
            .part("file", part);
        self.as_user(email, Method::POST, "/api/files/upload")
            .multipart(form)
            .send()
            .await
            .expect("upload request")
    }

    pub async fn mkdir(&self, email: &str, dir: &str, name: &str) -> reqwest::Response {
        self.as_user(email, Method::POST, "/api/files/mkdir")
            .form(&[("path", dir), ("name", name)])
            .send()
            .await
            .expect("mkdir request")
    }

    pub async fn list(&self, email: &str, dir: &str) -> reqwest::Response {
        self.as_user(email, Method::GET, "/api/files")
            .query(&[("path", dir)])
            .send()
            .await
            .expect("list request")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serves `router` on an ephemeral port; returns its base URL.
pub async fn spawn_stub(router: Router) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub address");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (format!("http://{addr}"), handle)
}

/// Asserts the uniform error body and returns its message.
pub async fn error_message(response: reqwest::Response) -> String {
    let body: serde_json::Value = response.json().await.expect("json error body");
    assert_eq!(body["status"], "error");
    body["error"].as_str().expect("error message").to_string()
}
