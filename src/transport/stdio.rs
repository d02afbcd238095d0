//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::error::{AppError, AppResult};
use crate::mcp::TalkToSqlService;
use crate::session::SharedSession;
use crate::transport::{Transport, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{info, warn};

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, following the MCP protocol specification.
pub struct StdioTransport {
    session: SharedSession,
}

impl StdioTransport {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> AppResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = TalkToSqlService::new(self.session.clone());
        let running_service = service.serve(stdio()).await.map_err(|e| {
            AppError::internal(format!("Failed to start stdio transport: {}", e))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        return Err(AppError::internal(format!(
                            "Stdio transport error: {}",
                            e
                        )));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        info!("Closing database connections");
        self.session.lock().await.disconnect().await;

        if shutdown_requested {
            // stdin reads cannot be interrupted by tokio::select!
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
