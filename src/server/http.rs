//! HTTP hosting for the Re-exporter (C6). Grounded on the teacher's `server::http` module: an
//! axum router nesting a `StreamableHttpService` at a fixed path, bound loopback-only by default,
//! shut down cooperatively via a `CancellationToken`. The bearer-auth gate has no direct teacher
//! analogue on the server side; it mirrors the header convention the teacher's
//! `client::http::build_http_client_with_auth` uses on the client side.

use crate::agent::Agent;
use crate::manager::Manager;
use crate::server::reexporter::Reexporter;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

const MCP_PATH: &str = "/mcp";

/// The token the Re-exporter requires on every request, loaded once at process start. Absence of
/// `MCP_SERVER_AUTH_TOKEN` in the environment is a fatal configuration error (checked by the
/// caller before `serve` is invoked, not by this module).
#[derive(Clone)]
struct AuthToken(Arc<str>);

async fn require_bearer(State(token): State<AuthToken>, request: Request<Body>, next: Next) -> Response {
    let header = request.headers().get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());

    let authorized = match header {
        Some(value) => value.strip_prefix("Bearer ").map(|t| t == token.0.as_ref()).unwrap_or(false),
        None => false,
    };

    if authorized {
        next.run(request).await
    } else {
        unauthorized_json_rpc_error()
    }
}

/// A structured JSON-RPC error response for a missing/mismatched bearer token (§4.6: "rejects
/// missing or mismatched bearer with a structured JSON-RPC error"). `-32001` follows the
/// JSON-RPC convention of reserving `-32000..-32099` for implementation-defined server errors.
fn unauthorized_json_rpc_error() -> Response {
    let body = json!({
        "jsonrpc": "2.0",
        "error": { "code": -32001, "message": "missing or invalid bearer token" },
        "id": null,
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Resolves the bind address for the Re-exporter. Defaults to loopback-only; a caller may widen
/// this deliberately via `bind_override`, but the default never listens beyond localhost.
pub fn resolve_bind_address(port: u16, bind_override: Option<&str>) -> Result<SocketAddr, std::io::Error> {
    let host = bind_override.unwrap_or("127.0.0.1");
    format!("{host}:{port}")
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid bind address: {e}")))
}

/// Serves the Re-exporter until `cancel` fires, then drains in-flight requests and returns.
pub async fn serve(addr: SocketAddr, auth_token: String, manager: Manager, agent: Arc<dyn Agent>, cancel: CancellationToken) -> std::io::Result<()> {
    let session_manager = Arc::new(LocalSessionManager::default());
    let service_manager = manager.clone();
    let service_agent = agent.clone();

    let service = StreamableHttpService::new(
        move || Ok(Reexporter::new(service_manager.clone(), service_agent.clone())),
        session_manager,
        StreamableHttpServerConfig {
            stateful_mode: true,
            sse_keep_alive: None,
            ..Default::default()
        },
    );

    let router = Router::new()
        .nest_service(MCP_PATH, service)
        .layer(middleware::from_fn_with_state(AuthToken(Arc::from(auth_token.as_str())), require_bearer));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, path = MCP_PATH, "re-exporter listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}
