//! Transport drivers (C1): the explicit capability interface §9 calls for in place of the
//! teacher's duck-typed toolkit objects. Both the stdio and http drivers implement
//! [`McpConnection`]; [`ConnectionFactory`] is the seam the Manager depends on so tests can
//! substitute a fake without spawning real processes or sockets.

pub mod http;
pub mod stdio;

use crate::error::GatewayError;
use crate::types::{ServerParams, ToolDescriptor};
use async_trait::async_trait;
use rmcp::model::CallToolResult;
use serde_json::Map as JsonMap;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A live, open channel to one upstream MCP server. Exclusively owned by the `ServerSession` that
/// created it (§5 resource ownership) — no other component holds a strong reference to it.
#[async_trait]
pub trait McpConnection: Send + Sync {
    /// Enumerates the tools currently exposed by the upstream server.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, GatewayError>;

    /// Invokes a named tool, bounded by `deadline`, observing `cancel`.
    async fn call_tool(
        &self,
        name: &str,
        arguments: JsonMap<String, Value>,
        deadline: Duration,
        cancel: CancellationToken,
    ) -> Result<CallToolResult, GatewayError>;

    /// Closes the connection. Must complete even if the peer already disconnected; errors are
    /// the caller's responsibility to swallow-and-log (§4.4 cleanup policy).
    async fn close(self: Box<Self>) -> Result<(), GatewayError>;
}

/// Opens a session for one server's params, dispatching to the stdio or http driver. Injectable
/// so the Manager can be exercised against a fake in tests (grounded in the design note:
/// "Testing requires the ability to construct an isolated Manager").
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open(&self, params: &ServerParams) -> Result<(Box<dyn McpConnection>, Vec<ToolDescriptor>), GatewayError>;
}

/// Production factory: stdio params spawn a child process, http params open a streamable HTTP
/// session, both via `rmcp`'s client transports.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConnectionFactory;

#[async_trait]
impl ConnectionFactory for DefaultConnectionFactory {
    async fn open(&self, params: &ServerParams) -> Result<(Box<dyn McpConnection>, Vec<ToolDescriptor>), GatewayError> {
        match params.transport {
            crate::types::Transport::Stdio => stdio::connect(params).await,
            crate::types::Transport::Http => http::connect(params).await,
        }
    }
}
