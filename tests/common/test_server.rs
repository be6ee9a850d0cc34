//! Test server
//!
//! Starts the real router on `127.0.0.1:0` so tests talk to it over TCP
//! exactly like a browser would.

use super::auth_helpers::TEST_SECRET;
use social_realtime::backend::server::{create_app, serve, AppState, RealtimeConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Server with the default configuration
    pub async fn start() -> Self {
        Self::start_with(base_config()).await
    }

    pub async fn start_with(config: RealtimeConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let (app, state) = create_app(config);
        let (shutdown, signal) = oneshot::channel::<()>();
        let handle = tokio::spawn({
            let state = state.clone();
            async move {
                let _ = serve(listener, app, state, async {
                    let _ = signal.await;
                })
                .await;
            }
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown),
            handle,
        }
    }

    /// `ws://` URL of the WebSocket endpoint with `token` in the query
    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}{}?token={}", self.addr, self.state.config.ws_path, token)
    }

    /// `ws://` URL without a credential
    pub fn ws_url_anonymous(&self) -> String {
        format!("ws://{}{}", self.addr, self.state.config.ws_path)
    }

    pub async fn connections(&self) -> usize {
        self.state.registry.len().await.expect("Registry stopped")
    }

    /// Wait until exactly `expected` connections are registered
    ///
    /// The upgrade response reaches the client before the server registers
    /// the connection, so tests wait here before relying on membership.
    pub async fn wait_for_connections(&self, expected: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.connections().await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        if waited.is_err() {
            panic!(
                "Expected {} connections, registry has {}",
                expected,
                self.connections().await
            );
        }
    }

    /// Trigger graceful shutdown and wait for the server task to finish
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = tokio::time::timeout(Duration::from_secs(5), &mut self.handle).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Valid configuration signed with `TEST_SECRET`
pub fn base_config() -> RealtimeConfig {
    RealtimeConfig::builder()
        .jwt_secret(TEST_SECRET)
        .build()
        .expect("Invalid test configuration")
}
