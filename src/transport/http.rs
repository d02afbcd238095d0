//! HTTP transport with Streamable HTTP support for the MCP server.
//!
//! This transport uses HTTP with SSE streaming responses,
//! which is suitable for web-based MCP integrations. All HTTP sessions
//! share the one talk-to-sql session.

use crate::error::{AppError, AppResult};
use crate::mcp::TalkToSqlService;
use crate::session::SharedSession;
use crate::transport::{Transport, wait_for_signal};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// HTTP transport implementation with Streamable HTTP support.
pub struct HttpTransport {
    session: SharedSession,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
    /// MCP endpoint path
    endpoint: String,
}

impl HttpTransport {
    pub fn new(
        session: SharedSession,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            session,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the MCP endpoint path.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> AppResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting MCP server with HTTP transport on {}", bind_addr);

        let session = self.session.clone();
        let service = StreamableHttpService::new(
            move || Ok(TalkToSqlService::new(session.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service doesn't support root path "/", use fallback_service instead
        let app = if self.endpoint == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.endpoint, service)
        };

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            AppError::internal(format!(
                "Failed to bind to {}: {}. Check that the port is available",
                bind_addr, e
            ))
        })?;

        info!(endpoint = %self.endpoint, "MCP endpoint ready");

        // SSE connections may keep the server alive indefinitely,
        // so force exit after a timeout once shutdown is requested
        const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();
        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(AppError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        info!("Closing database connections");
        self.session.lock().await.disconnect().await;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineOptions, PoolOptions};
    use crate::llm::CompletionBackend;
    use crate::session::Session;
    use async_trait::async_trait;

    struct Unused;

    #[async_trait]
    impl CompletionBackend for Unused {
        async fn complete(&self, _prompt: &str) -> AppResult<String> {
            Err(AppError::translation("unused"))
        }

        fn name(&self) -> &str {
            "unused"
        }
    }

    fn shared() -> SharedSession {
        Session::new(
            Arc::new(Unused),
            PoolOptions::default(),
            PipelineOptions::default(),
        )
        .into_shared()
    }

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new(shared(), "127.0.0.1", 8080, "/mcp");
        assert_eq!(transport.name(), "http");
        assert_eq!(transport.bind_addr(), "127.0.0.1:8080");
        assert_eq!(transport.endpoint(), "/mcp");
    }

    #[test]
    fn test_http_transport_root_endpoint() {
        let transport = HttpTransport::new(shared(), "0.0.0.0", 3000, "/");
        assert_eq!(transport.bind_addr(), "0.0.0.0:3000");
        assert_eq!(transport.endpoint(), "/");
    }
}
