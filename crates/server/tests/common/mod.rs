//! # Common Test Utilities
//!
//! `TestApp` spawns the real server on a random port with a temporary SQLite
//! database, and points the completion and embedding clients at an
//! `httpmock::MockServer`.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::{Method::POST, Mock, MockServer};
use leadrag_server::{
    config, router,
    state::{build_app_state, AppState},
};
use reqwest::Client;
use serde_json::{json, Value};
use std::{fs::File, io::Write, net::SocketAddr, path::PathBuf};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const EMBEDDINGS_PATH: &str = "/v1/embeddings";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _db_file: NamedTempFile,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the server with the default configuration.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with("").await
    }

    /// Spawns the server; `extra_yaml` is appended to the generated config.
    pub async fn spawn_with(extra_yaml: &str) -> Result<Self> {
        leadrag_test_utils::setup_tracing();

        let mock_server = MockServer::start_async().await;
        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_path_buf();

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: "{}"
embedding:
  api_url: "{}"
  model_name: "mock-embedding-model"
  dimension: 3
  max_attempts: 2
  base_delay_ms: 1
  max_delay_ms: 5
completion:
  api_url: "{}"
  api_key: "test-key"
  model_name: "mock-chat-model"
{}
"#,
            db_path.to_string_lossy(),
            mock_server.url(EMBEDDINGS_PATH),
            mock_server.url(COMPLETIONS_PATH),
            extra_yaml
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(&config_path.to_string_lossy()))?;
        let app_state = build_app_state(config).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            db_path,
            app_state: app_state_for_harness,
            _db_file: db_file,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Answers every completion request with `reply`.
    pub async fn mock_completion(&self, reply: &str) -> Mock<'_> {
        let body = completion_body(reply);
        self.mock_server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH);
                then.status(200).json_body(body);
            })
            .await
    }

    /// Answers completion requests whose body contains `needle` with `reply`.
    pub async fn mock_completion_containing(&self, needle: &str, reply: &str) -> Mock<'_> {
        let body = completion_body(reply);
        let needle = needle.to_string();
        self.mock_server
            .mock_async(|when, then| {
                when.method(POST).path(COMPLETIONS_PATH).body_contains(needle);
                then.status(200).json_body(body);
            })
            .await
    }

    /// Answers every embedding request with `vector`.
    pub async fn mock_embedding(&self, vector: &[f32]) -> Mock<'_> {
        let body = json!({ "data": [{ "embedding": vector, "index": 0 }] });
        self.mock_server
            .mock_async(|when, then| {
                when.method(POST).path(EMBEDDINGS_PATH);
                then.status(200).json_body(body);
            })
            .await
    }

    /// Posts a JSON body and returns the status and the parsed response.
    pub async fn post_json(&self, path: &str, body: Value) -> Result<(u16, Value)> {
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        let status = response.status().as_u16();
        let value = response.json().await.unwrap_or(Value::Null);
        Ok((status, value))
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn completion_body(reply: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": reply },
            "finish_reason": "stop"
        }]
    })
}

/// Reads a text column, `None` for anything else.
pub fn text(value: turso::Value) -> Option<String> {
    match value {
        turso::Value::Text(text) => Some(text),
        _ => None,
    }
}
