//! Talk to SQL - Main entry point.
//!
//! Runs the MCP server that answers questions about a SQL database
//! (PostgreSQL, MySQL) with generated SQL.

use clap::Parser;
use talk_to_sql::config::{Config, TransportMode};
use talk_to_sql::llm;
use talk_to_sql::session::Session;
use talk_to_sql::tools::ConnectionToolHandler;
use talk_to_sql::transport::{HttpTransport, StdioTransport, Transport};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the stdio MCP channel.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    info!(
        transport = %config.transport,
        llm_provider = %config.llm_provider,
        llm_model = %config.llm_model,
        "Starting talk-to-sql v{}",
        env!("CARGO_PKG_VERSION")
    );

    let llm_settings = config.llm_settings();
    if llm_settings.api_key.is_empty() {
        warn!(
            env = config.llm_provider.api_key_env(),
            "No completion API key configured; questions will fail until one is set"
        );
    }

    let pool_options = config.pool_options()?;
    let startup_target = config.server_target()?;
    let backend = llm::from_settings(&llm_settings)?;
    let session = Session::new(backend, pool_options, config.pipeline_options()).into_shared();

    // A failed startup connection is not fatal; connect_server can be retried
    if let Some(target) = startup_target {
        let database = target.database.clone();
        let handler = ConnectionToolHandler::new(session.clone());
        match handler.connect_target(target, database.as_deref()).await {
            Ok(output) => info!(
                databases = output.count,
                selected = ?output.selected.map(|s| s.database),
                "Startup connection ready"
            ),
            Err(e) => warn!(error = %e, "Startup connection failed"),
        }
    }

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(session).run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                session,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
