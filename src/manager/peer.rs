//! Peer registry (C5): thin façade letting external API layers add/remove HTTP-transport
//! upstreams after startup. Performs argument validation and delegates to
//! [`Manager::add_peer`]/[`Manager::remove_peer`]; grounded on the teacher's
//! `client::gateway::McpClientGateway::start_plugin`'s validate-then-delegate shape.

use super::Manager;
use crate::error::GatewayError;
use crate::types::{AuthConfig, HttpParams, ServerInfo, ServerParams, Transport};

/// Validates and registers a new HTTP peer. Returns a compact status including the negotiated
/// tool count (carried on `ServerInfo.functions`).
pub async fn add_peer(manager: &Manager, name: &str, url: &str, auth_token: Option<String>) -> Result<ServerInfo, GatewayError> {
    if name.trim().is_empty() {
        return Err(GatewayError::invalid_config(name, "peer name must not be empty"));
    }

    url::Url::parse(url).map_err(|e| GatewayError::invalid_config(name, format!("invalid peer url '{url}': {e}")))?;

    let params = ServerParams {
        name: name.to_string(),
        transport: Transport::Http,
        enabled: true,
        timeout_seconds: crate::config::DEFAULT_TIMEOUT_SECONDS,
        description: None,
        stdio: None,
        http: Some(HttpParams {
            url: url.to_string(),
            auth: auth_token.map(|token| AuthConfig::Bearer { token }),
        }),
    };

    manager.add_peer(params).await
}

/// Removes a peer by name. Only HTTP-transport entries are treated as peers for this façade;
/// stdio entries are out of scope for dynamic (un)registration.
pub async fn remove_peer(manager: &Manager, name: &str) -> Result<(), GatewayError> {
    manager.remove_peer(name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ConnectionFactory, DefaultConnectionFactory};
    use std::sync::Arc;

    #[tokio::test]
    async fn rejects_malformed_url() {
        let manager = Manager::new(Arc::new(DefaultConnectionFactory) as Arc<dyn ConnectionFactory>);
        let err = add_peer(&manager, "peer", "not-a-url", None).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn rejects_empty_name() {
        let manager = Manager::new(Arc::new(DefaultConnectionFactory) as Arc<dyn ConnectionFactory>);
        let err = add_peer(&manager, "", "http://stub/mcp", None).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidConfig { .. }));
    }
}
