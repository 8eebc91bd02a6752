//! Core data model: `ServerParams`, `ToolDescriptor`, `ToolSelection`, and the snapshot types
//! handed back by read-only Manager queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Default per-call tool timeout when the caller supplies none (§5).
pub const DEFAULT_CALL_TIMEOUT_SECONDS: u64 = 60;

/// Transport kind a server is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Http,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Authentication scheme for an `http` server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    Bearer { token: String },
    ApiKey { token: String, header_name: Option<String> },
}

impl AuthConfig {
    /// The header name/value pair to attach to outgoing requests for this scheme.
    pub fn header(&self) -> (String, String) {
        match self {
            Self::Bearer { token } => ("Authorization".to_string(), format!("Bearer {token}")),
            Self::ApiKey { token, header_name } => {
                let name = header_name.clone().unwrap_or_else(|| "X-API-Key".to_string());
                (name, token.clone())
            }
        }
    }
}

/// stdio-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdioParams {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<(String, String)>,
}

/// http-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpParams {
    pub url: String,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

/// Immutable, validated parameters for one server entry (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerParams {
    pub name: String,
    pub transport: Transport,
    pub enabled: bool,
    pub timeout_seconds: u64,
    pub description: Option<String>,
    pub stdio: Option<StdioParams>,
    pub http: Option<HttpParams>,
}

impl ServerParams {
    pub fn stdio(&self) -> Option<&StdioParams> {
        self.stdio.as_ref()
    }

    pub fn http(&self) -> Option<&HttpParams> {
        self.http.as_ref()
    }
}

/// A single tool exposed by an upstream server, as observed via `listTools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
    /// Weak back-reference to the owning server; never used to reach the session directly.
    pub server_name: String,
}

/// A request-scoped selection of which functions of a server to expose to an agent turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolSelection {
    pub server_name: String,
    /// `None` means "entire server".
    pub functions: Option<Vec<String>>,
}

/// Read-only snapshot of one server's state, as returned by `Manager::list_servers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub enabled: bool,
    pub connected: bool,
    pub description: Option<String>,
    pub functions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_authorization() {
        let auth = AuthConfig::Bearer { token: "t".into() };
        assert_eq!(auth.header(), ("Authorization".to_string(), "Bearer t".to_string()));
    }

    #[test]
    fn api_key_defaults_to_x_api_key_header() {
        let auth = AuthConfig::ApiKey {
            token: "t".into(),
            header_name: None,
        };
        assert_eq!(auth.header(), ("X-API-Key".to_string(), "t".to_string()));
    }

    #[test]
    fn api_key_honors_custom_header_name() {
        let auth = AuthConfig::ApiKey {
            token: "t".into(),
            header_name: Some("X-Custom".into()),
        };
        assert_eq!(auth.header().0, "X-Custom");
    }
}
