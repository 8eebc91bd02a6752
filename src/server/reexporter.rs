//! Re-exporter (C6): an MCP server exposing the fixed six-tool table backed by the Manager.
//! Grounded on the teacher's `server::core::OattyMcpCore` — the `#[tool_router]`/`#[tool]`/
//! `ServerHandler`/`get_info()` idiom is kept verbatim; the product-specific tool methods are
//! replaced wholesale with the spec's fixed set.

use crate::agent::Agent;
use crate::logging::sanitize_log_text;
use crate::manager::Manager;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ServerNameParam {
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChatParam {
    pub message: String,
    #[serde(default)]
    pub model_key: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// The MCP server this gateway publishes at `/mcp` so other gateways can treat it as a peer.
/// Holds only a `Manager` (cheap-clone handle, not a strong owner of any session) and an `Agent`.
#[derive(Clone)]
pub struct Reexporter {
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
    manager: Manager,
    agent: Arc<dyn Agent>,
}

#[tool_router]
impl Reexporter {
    pub fn new(manager: Manager, agent: Arc<dyn Agent>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            manager,
            agent,
        }
    }

    #[tool(description = "Snapshot of Manager state: names, states, function counts.")]
    async fn list_mcp_servers(&self) -> Result<CallToolResult, ErrorData> {
        let servers = self.manager.list_servers().await;
        Ok(CallToolResult::success(vec![Content::text(json!(servers).to_string())]))
    }

    #[tool(description = "Tool names exposed by a given server.")]
    async fn get_mcp_server_functions(&self, Parameters(param): Parameters<ServerNameParam>) -> Result<CallToolResult, ErrorData> {
        let servers = self.manager.list_servers().await;
        match servers.into_iter().find(|s| s.name == param.name) {
            Some(info) => Ok(CallToolResult::success(vec![Content::text(json!(info.functions).to_string())])),
            None => Ok(CallToolResult::error(vec![Content::text(format!("server '{}' not found", param.name))])),
        }
    }

    #[tool(description = "Reloads one server: closes its existing session and rebuilds it from its params.")]
    async fn reload_mcp_server(&self, Parameters(param): Parameters<ServerNameParam>) -> Result<CallToolResult, ErrorData> {
        match self.manager.reload(&param.name).await {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!("server '{}' reloaded", param.name))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(sanitize_log_text(&e.to_string()))])),
        }
    }

    #[tool(description = "Reloads every enabled server.")]
    async fn reload_all_mcp_servers(&self) -> Result<CallToolResult, ErrorData> {
        let results = self.manager.reload_all().await;
        let summary: Vec<_> = results
            .into_iter()
            .map(|(name, result)| json!({"name": name, "ok": result.is_ok(), "error": result.err().map(|e| sanitize_log_text(&e.to_string()))}))
            .collect();
        Ok(CallToolResult::success(vec![Content::text(json!(summary).to_string())]))
    }

    #[tool(description = "Names of servers currently in the Ready state.")]
    async fn get_available_mcp_servers(&self) -> Result<CallToolResult, ErrorData> {
        let names: Vec<String> = self.manager.list_servers().await.into_iter().filter(|s| s.connected).map(|s| s.name).collect();
        Ok(CallToolResult::success(vec![Content::text(json!(names).to_string())]))
    }

    #[tool(description = "Delegates to the local agent, which may recursively consume Manager toolkits.")]
    async fn chat(&self, Parameters(param): Parameters<ChatParam>) -> Result<CallToolResult, ErrorData> {
        let ready_names: Vec<String> = self.manager.list_servers().await.into_iter().filter(|s| s.connected).map(|s| s.name).collect();

        let mut toolkits = Vec::with_capacity(ready_names.len());
        for name in ready_names {
            if let Ok(toolkit) = self.manager.get_toolkit(&name, None).await {
                toolkits.push(toolkit);
            }
        }

        let turn = self.agent.run(param.message, param.conversation_id, param.model_key, toolkits).await;
        Ok(CallToolResult::success(vec![Content::text(turn.final_text)]))
    }
}

#[tool_handler]
impl ServerHandler for Reexporter {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-gateway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "This server re-exports an MCP gateway's locally-aggregated tool servers and agent. \
                 Use list_mcp_servers/get_mcp_server_functions to discover what is available, \
                 reload_mcp_server(name)/reload_all_mcp_servers to recover a failed connection, \
                 and chat(message) to delegate a turn to the local agent."
                    .to_string(),
            ),
        }
    }
}
