//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinHandle;

use cx_webhook::{ServerConfig, ServerError, ServerHandle, Shutdown, WebhookServer};

/// Config bound to an ephemeral loopback port with a short shutdown window.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.shutdown.timeout_secs = 1;
    config
}

/// A running server under test.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
    pub parent: Shutdown,
    pub task: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait for `listen_and_serve` to return, failing the test after `limit`.
    pub async fn join(self, limit: Duration) -> Result<(), ServerError> {
        tokio::time::timeout(limit, self.task)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Spawn `server` and wait until it is accepting connections.
pub async fn start_server(server: WebhookServer) -> RunningServer {
    let handle = server.handle();
    let parent = Shutdown::new();
    let task = tokio::spawn(server.listen_and_serve(parent.subscribe()));
    let addr = handle.listening().await.expect("server failed to bind");
    RunningServer {
        addr,
        handle,
        parent,
        task,
    }
}

/// Minimal webhook body for session `session` with the given parameters.
pub fn webhook_body(session: &str, parameters: serde_json::Value) -> String {
    serde_json::json!({
        "detectIntentResponseId": "resp-1",
        "languageCode": "en",
        "fulfillmentInfo": { "tag": "test" },
        "sessionInfo": { "session": session, "parameters": parameters },
    })
    .to_string()
}
