//! The LLM agent boundary (§6 "Consumed from external collaborators"). The core never inspects
//! agent internals; it only calls `run` with a message and the Toolkits it resolved. Modeled as a
//! trait object so the gateway can be exercised in tests without any concrete LLM provider,
//! mirroring the teacher's own boundary-trait style (`provider::McpProviderOps`).

use crate::toolkit::Toolkit;
use async_trait::async_trait;
use serde_json::Value;

/// Result of one agent turn: the text shown to the user and an opaque trace for diagnostics.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub final_text: String,
    pub trace: Value,
}

/// The single entry point the core calls into. The agent chooses which tool(s) of the supplied
/// toolkits to invoke, if any; the core does not mediate that choice.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(
        &self,
        message: String,
        conversation_id: Option<String>,
        model_key: Option<String>,
        toolkits: Vec<Toolkit>,
    ) -> AgentTurn;
}

/// A trivial agent used in tests and as a safe default before a real provider is wired in: it
/// echoes the incoming message back verbatim and never invokes a tool.
pub struct EchoAgent;

#[async_trait]
impl Agent for EchoAgent {
    async fn run(&self, message: String, _conversation_id: Option<String>, _model_key: Option<String>, _toolkits: Vec<Toolkit>) -> AgentTurn {
        AgentTurn {
            final_text: message,
            trace: Value::Null,
        }
    }
}
