//! stdio transport driver (§4.1): spawns a child process and performs the MCP handshake over
//! `rmcp`'s `TokioChildProcess` transport, bounded by `timeoutSeconds`. Grounded on the teacher's
//! `client::core::McpClient::connect` stdio branch, the mature rmcp-native variant.

use super::McpConnection;
use crate::error::GatewayError;
use crate::types::{ServerParams, ToolDescriptor};
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::ServiceExt;
use serde_json::Map as JsonMap;
use serde_json::Value;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub struct StdioConnection {
    name: String,
    service: RunningService<RoleClient, ()>,
}

pub async fn connect(params: &ServerParams) -> Result<(Box<dyn McpConnection>, Vec<ToolDescriptor>), GatewayError> {
    let stdio = params
        .stdio()
        .ok_or_else(|| GatewayError::invalid_config(&params.name, "missing stdio params"))?;

    if stdio.command.trim().is_empty() {
        return Err(GatewayError::invalid_config(&params.name, "empty command"));
    }

    let mut command = Command::new(&stdio.command);
    command.args(&stdio.args);
    for (key, value) in &stdio.env {
        command.env(key, value);
    }

    let transport = TokioChildProcess::new(command)
        .map_err(|e| GatewayError::connection(&params.name, format!("failed to spawn child process: {e}")))?;

    let handshake = async { ().serve(transport).await };
    let service = tokio::time::timeout(Duration::from_secs(params.timeout_seconds), handshake)
        .await
        .map_err(|_| GatewayError::connection_timeout(&params.name, "stdio handshake exceeded timeout_seconds"))?
        .map_err(|e| GatewayError::connection(&params.name, format!("handshake failed: {e}")))?;

    let tools = list_tools_from_service(&params.name, &service).await?;

    Ok((Box::new(StdioConnection { name: params.name.clone(), service }), tools))
}

async fn list_tools_from_service(server_name: &str, service: &RunningService<RoleClient, ()>) -> Result<Vec<ToolDescriptor>, GatewayError> {
    let tools = service
        .list_all_tools()
        .await
        .map_err(|e| GatewayError::connection(server_name, format!("list_tools failed: {e}")))?;

    Ok(tools
        .into_iter()
        .map(|t| ToolDescriptor {
            name: t.name.to_string(),
            description: t.description.as_ref().map(|d| d.to_string()),
            input_schema: Value::Object((*t.input_schema).clone()),
            server_name: server_name.to_string(),
        })
        .collect())
}

#[async_trait]
impl McpConnection for StdioConnection {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, GatewayError> {
        list_tools_from_service(&self.name, &self.service).await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: JsonMap<String, Value>,
        deadline: Duration,
        cancel: CancellationToken,
    ) -> Result<CallToolResult, GatewayError> {
        let request = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: Some(arguments),
        };

        tokio::select! {
            result = tokio::time::timeout(deadline, self.service.call_tool(request)) => {
                match result {
                    Ok(Ok(call_result)) => Ok(call_result),
                    Ok(Err(e)) => Err(GatewayError::tool_execution(&self.name, name, e.to_string())),
                    Err(_) => Err(GatewayError::tool_deadline_exceeded(&self.name, name)),
                }
            }
            _ = cancel.cancelled() => {
                Err(GatewayError::cancelled(&self.name))
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), GatewayError> {
        self.service
            .cancel()
            .await
            .map_err(|e| GatewayError::connection(&self.name, format!("close failed: {e}")))?;
        Ok(())
    }
}
