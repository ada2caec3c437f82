#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use worklog_sheets_api::config::SecurityConfig;
use worklog_sheets_api::sheets::{MemoryStore, StoreManager};
use worklog_sheets_api::{app, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    /// Backing store, for asserting on the physical rows.
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Registers `username` (password `secret`) and returns `(token, user_id)`.
    pub async fn register(&self, username: &str) -> Result<(String, String)> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "username": username, "password": "secret" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register returned {}", res.status());

        let body: Value = res.json().await?;
        let token = body["token"].as_str().context("token missing")?.to_string();
        let id = body["user"]["id"].as_str().context("user id missing")?.to_string();
        Ok((token, id))
    }

    /// Creates a worklog and returns the stored record.
    pub async fn create_worklog(&self, token: &str, date: &str, hours: Value) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/api/worklogs"))
            .bearer_auth(token)
            .json(&json!({ "date": date, "duration_hours": hours, "reason": "release" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create returned {}", res.status());

        let body: Value = res.json().await?;
        Ok(body["data"].clone())
    }
}

/// Boots the real router on a free port, backed by a fresh in-memory store
/// with provisioned headers. The server lives as long as the test's runtime.
pub async fn spawn_server() -> Result<TestServer> {
    let store = Arc::new(MemoryStore::new());
    let stores = Arc::new(StoreManager::with_store(store.clone()));
    let security = SecurityConfig {
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expires_in: "1h".to_string(),
    };
    let state = AppState::with_stores(stores, &security)?;
    state.initialize_tables().await?;

    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state, false)).await;
    });

    Ok(TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    })
}
