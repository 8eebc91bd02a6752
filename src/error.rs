//! Exhaustive error kind for the gateway core.
//!
//! Every failure path in this crate resolves to one of the nine kinds named in the design —
//! there is no per-module error type hierarchy. Constructors keep call sites terse and keep the
//! server name attached wherever the design requires it.

use thiserror::Error;

/// The gateway's single error type. Variant names are the closed set of error kinds; nothing in
/// this crate should need a kind outside this enum.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid config for server '{server}': {message}")]
    InvalidConfig { server: String, message: String },

    #[error("connection error for server '{server}': {message}")]
    ConnectionError { server: String, message: String },

    #[error("connection to server '{server}' timed out: {message}")]
    ConnectionTimeoutError { server: String, message: String },

    #[error("server '{server}' not found")]
    NotFound { server: String },

    #[error("server '{server}' is not ready")]
    NotReady { server: String },

    #[error("server '{server}' is disabled")]
    Disabled { server: String },

    #[error("invalid arguments for tool '{tool}' on server '{server}': {message}")]
    InvalidArgs { server: String, tool: String, message: String },

    #[error("tool execution error for '{tool}' on server '{server}': {message}")]
    ToolExecutionError {
        server: String,
        tool: String,
        message: String,
        deadline_exceeded: bool,
    },

    #[error("operation on server '{server}' was cancelled")]
    Cancelled { server: String },
}

impl GatewayError {
    pub fn invalid_config(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn connection(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionError {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn connection_timeout(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionTimeoutError {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn not_found(server: impl Into<String>) -> Self {
        Self::NotFound { server: server.into() }
    }

    pub fn not_ready(server: impl Into<String>) -> Self {
        Self::NotReady { server: server.into() }
    }

    pub fn disabled(server: impl Into<String>) -> Self {
        Self::Disabled { server: server.into() }
    }

    pub fn invalid_args(server: impl Into<String>, tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgs {
            server: server.into(),
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn tool_execution(server: impl Into<String>, tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecutionError {
            server: server.into(),
            tool: tool.into(),
            message: message.into(),
            deadline_exceeded: false,
        }
    }

    pub fn tool_deadline_exceeded(server: impl Into<String>, tool: impl Into<String>) -> Self {
        Self::ToolExecutionError {
            server: server.into(),
            tool: tool.into(),
            message: "deadline exceeded".to_string(),
            deadline_exceeded: true,
        }
    }

    pub fn cancelled(server: impl Into<String>) -> Self {
        Self::Cancelled { server: server.into() }
    }

    /// The server name this error is annotated with, for callers that want to log it uniformly.
    pub fn server_name(&self) -> &str {
        match self {
            Self::InvalidConfig { server, .. }
            | Self::ConnectionError { server, .. }
            | Self::ConnectionTimeoutError { server, .. }
            | Self::NotFound { server }
            | Self::NotReady { server }
            | Self::Disabled { server }
            | Self::InvalidArgs { server, .. }
            | Self::ToolExecutionError { server, .. }
            | Self::Cancelled { server } => server,
        }
    }

    /// HTTP status an embedding REST layer should map this error kind to (§6 failure surfacing).
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::InvalidConfig { .. } | Self::InvalidArgs { .. } => 400,
            Self::NotReady { .. } | Self::Disabled { .. } => 409,
            Self::ConnectionTimeoutError { .. } => 504,
            Self::ConnectionError { .. } => 502,
            Self::ToolExecutionError { .. } => 502,
            Self::Cancelled { .. } => 499,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping_matches_design() {
        assert_eq!(GatewayError::not_found("x").http_status(), 404);
        assert_eq!(GatewayError::invalid_config("x", "bad").http_status(), 400);
        assert_eq!(GatewayError::invalid_args("x", "t", "bad").http_status(), 400);
        assert_eq!(GatewayError::not_ready("x").http_status(), 409);
        assert_eq!(GatewayError::disabled("x").http_status(), 409);
        assert_eq!(GatewayError::connection_timeout("x", "slow").http_status(), 504);
        assert_eq!(GatewayError::connection("x", "refused").http_status(), 502);
        assert_eq!(GatewayError::tool_execution("x", "t", "boom").http_status(), 502);
    }

    #[test]
    fn constructors_preserve_server_name() {
        let err = GatewayError::not_ready("fs");
        assert_eq!(err.server_name(), "fs");
    }

    #[test]
    fn deadline_exceeded_tag_is_set() {
        let err = GatewayError::tool_deadline_exceeded("fs", "slow_tool");
        match err {
            GatewayError::ToolExecutionError { deadline_exceeded, .. } => assert!(deadline_exceeded),
            _ => panic!("expected ToolExecutionError"),
        }
    }
}
