//! `ServerSession` and its state machine (§3, §4.4).

use crate::client::McpConnection;
use crate::error::GatewayError;
use crate::types::{ServerParams, ToolDescriptor};
use std::sync::Arc;

/// States a `ServerSession` moves through. Transitions are driven exclusively by [`crate::manager::Manager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Initializing,
    Ready,
    Failed,
    Closing,
    Closed,
}

impl SessionState {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_terminal_for_init(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

/// One server's live state: its immutable params, current state, live toolkit catalog (when
/// `Ready`), last error (when `Failed`), and the transport handle it exclusively owns.
pub struct ServerSession {
    pub params: ServerParams,
    pub state: SessionState,
    pub tools: Vec<ToolDescriptor>,
    pub last_error: Option<String>,
    pub connection: Option<Box<dyn McpConnection>>,
}

impl ServerSession {
    /// A fresh session in `Pending`, not yet handed to the transport layer.
    pub fn pending(params: ServerParams) -> Self {
        Self {
            params,
            state: SessionState::Pending,
            tools: Vec::new(),
            last_error: None,
            connection: None,
        }
    }

    pub fn mark_initializing(&mut self) {
        self.state = SessionState::Initializing;
        self.last_error = None;
    }

    pub fn mark_ready(&mut self, connection: Box<dyn McpConnection>, tools: Vec<ToolDescriptor>) {
        self.connection = Some(connection);
        self.tools = tools;
        self.state = SessionState::Ready;
        self.last_error = None;
    }

    pub fn mark_failed(&mut self, error: &GatewayError) {
        self.state = SessionState::Failed;
        self.last_error = Some(error.to_string());
        self.connection = None;
        self.tools.clear();
    }

    pub fn mark_closing(&mut self) {
        self.state = SessionState::Closing;
    }

    /// Releases the transport handle and transitions to `Closed`, per invariant 4: this must run
    /// even if `state` was `Failed`, so callers should invoke it unconditionally during removal.
    pub async fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                tracing::warn!(server = %self.params.name, error = %e, "error closing session (swallowed)");
            }
        }
        self.tools.clear();
        self.state = SessionState::Closed;
    }

    pub fn function_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }
}

impl std::fmt::Debug for ServerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSession")
            .field("name", &self.params.name)
            .field("state", &self.state)
            .field("tool_count", &self.tools.len())
            .field("last_error", &self.last_error)
            .finish()
    }
}

pub type SharedSession = Arc<tokio::sync::Mutex<ServerSession>>;
