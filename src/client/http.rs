//! Streaming HTTP transport driver (§4.1): opens a persistent logical session via `rmcp`'s
//! `StreamableHttpClientTransport`, with auth headers attached per the configured scheme.
//! Grounded on the teacher's `client::core::McpClient::connect` http branch and
//! `client::http::build_http_client_with_auth`, trimmed of the OAuth/keyring path (§3 only names
//! bearer/apiKey carried as a literal token).

use super::McpConnection;
use crate::error::GatewayError;
use crate::types::{ServerParams, ToolDescriptor};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::ServiceExt;
use serde_json::Map as JsonMap;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct HttpConnection {
    name: String,
    service: RunningService<RoleClient, ()>,
}

pub async fn connect(params: &ServerParams) -> Result<(Box<dyn McpConnection>, Vec<ToolDescriptor>), GatewayError> {
    let http_params = params
        .http()
        .ok_or_else(|| GatewayError::invalid_config(&params.name, "missing http params"))?;

    let mut headers = HeaderMap::new();
    if let Some(auth) = &http_params.auth {
        let (header_name, header_value) = auth.header();
        let name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|_| GatewayError::invalid_config(&params.name, format!("invalid auth header name '{header_name}'")))?;
        let value = HeaderValue::from_str(&header_value)
            .map_err(|_| GatewayError::invalid_config(&params.name, "invalid auth header value"))?;
        headers.insert(name, value);
    }

    let http_client = reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| GatewayError::connection(&params.name, format!("failed to build http client: {e}")))?;

    let transport = StreamableHttpClientTransport::with_client(
        http_client,
        StreamableHttpClientTransportConfig::with_uri(http_params.url.clone()),
    );

    let handshake = async { ().serve(transport).await };
    let service = tokio::time::timeout(Duration::from_secs(params.timeout_seconds), handshake)
        .await
        .map_err(|_| GatewayError::connection_timeout(&params.name, "http handshake exceeded timeout_seconds"))?
        .map_err(|e| GatewayError::connection(&params.name, format!("handshake failed: {e}")))?;

    let tools = list_tools_from_service(&params.name, &service).await?;

    Ok((Box::new(HttpConnection { name: params.name.clone(), service }), tools))
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
impl McpConnection for HttpConnection {
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
                    // A mid-call transport disconnect surfaces here as a tool-execution error for
                    // this call only (§4.1); the session transitions to Failed by the Manager.
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
