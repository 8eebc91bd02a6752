//! Process entrypoint. Grounded on the teacher's `main.rs`/`server` binary wiring: init tracing,
//! load configuration, build the core, serve until a shutdown signal arrives, then tear down.

use mcp_gateway::server::http;
use mcp_gateway::{config, logging, Manager};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const AUTH_TOKEN_ENV: &str = "MCP_SERVER_AUTH_TOKEN";
const PORT_ENV: &str = "MCP_SERVER_PORT";
const DEFAULT_PORT: u16 = 8282;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_tracing();

    let auth_token = match env::var(AUTH_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => token,
        _ => {
            error!("{AUTH_TOKEN_ENV} must be set to a non-empty value; refusing to start");
            return ExitCode::FAILURE;
        }
    };

    let base_path = env::current_dir().map(|p| p.display().to_string()).unwrap_or_else(|_| ".".to_string());

    let manager = Manager::with_default_transports();

    let catalog = match config::load_catalog(&base_path).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "failed to load catalog");
            return ExitCode::FAILURE;
        }
    };

    let summary = manager.initialize(catalog).await;
    info!(total = summary.total, ready = summary.ready, failed = summary.failed, "manager initialized");

    let agent: Arc<dyn mcp_gateway::agent::Agent> = Arc::new(mcp_gateway::agent::EchoAgent);

    let port = env::var(PORT_ENV).ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT);
    let addr = match http::resolve_bind_address(port, None) {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, "failed to resolve bind address");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        shutdown_cancel.cancel();
    });

    let result = http::serve(addr, auth_token, manager.clone(), agent, cancel).await;
    manager.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "re-exporter exited with an error");
            ExitCode::FAILURE
        }
    }
}
