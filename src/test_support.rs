//! Fakes shared between unit tests and the scenario suite under `tests/`. Not part of the public
//! API surface for ordinary consumers — gated behind the `test-support` feature, which the crate's
//! own `[dev-dependencies]` entry enables for integration tests.

use crate::client::{ConnectionFactory, McpConnection};
use crate::error::GatewayError;
use crate::types::{ServerParams, ToolDescriptor};
use async_trait::async_trait;
use rmcp::model::CallToolResult;
use serde_json::{Map as JsonMap, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A connection that always succeeds, reporting whatever tool list it was built with and counting
/// how many times each of its tools was invoked.
pub struct FakeConnection {
    pub tools: Vec<ToolDescriptor>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl McpConnection for FakeConnection {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, GatewayError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, _name: &str, _arguments: JsonMap<String, Value>, _deadline: Duration, _cancel: CancellationToken) -> Result<CallToolResult, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CallToolResult::success(vec![]))
    }

    async fn close(self: Box<Self>) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// A `ConnectionFactory` whose per-server tool list and failure behavior can be scripted before
/// each scenario runs.
pub struct FakeFactory {
    should_fail: StdMutex<HashMap<String, bool>>,
    tool_names: StdMutex<HashMap<String, Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl Default for FakeFactory {
    fn default() -> Self {
        Self {
            should_fail: StdMutex::new(HashMap::new()),
            tool_names: StdMutex::new(HashMap::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(self: &Arc<Self>, name: &str) {
        self.should_fail.lock().unwrap().insert(name.to_string(), true);
    }

    pub fn unfail(self: &Arc<Self>, name: &str) {
        self.should_fail.lock().unwrap().insert(name.to_string(), false);
    }

    pub fn with_tools(self: &Arc<Self>, name: &str, tools: Vec<String>) {
        self.tool_names.lock().unwrap().insert(name.to_string(), tools);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory for FakeFactory {
    async fn open(&self, params: &ServerParams) -> Result<(Box<dyn McpConnection>, Vec<ToolDescriptor>), GatewayError> {
        if *self.should_fail.lock().unwrap().get(&params.name).unwrap_or(&false) {
            return Err(GatewayError::connection(&params.name, "stub refused"));
        }

        let names = self
            .tool_names
            .lock()
            .unwrap()
            .get(&params.name)
            .cloned()
            .unwrap_or_else(|| vec!["only_one".to_string()]);

        let tools: Vec<ToolDescriptor> = names
            .into_iter()
            .map(|name| ToolDescriptor {
                name,
                description: Some("a fake tool".into()),
                input_schema: Value::Object(Default::default()),
                server_name: params.name.clone(),
            })
            .collect();

        Ok((Box::new(FakeConnection { tools: tools.clone(), calls: self.calls.clone() }), tools))
    }
}
