//! Dual-role Model Context Protocol gateway: a Manager (C4) that aggregates upstream MCP servers
//! as a client, and a Re-exporter (C6) that republishes the local Manager and Agent as a peer MCP
//! server. See `SPEC_FULL.md` for the module map this crate implements and `DESIGN.md` for where
//! each piece is grounded.

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod server;
pub mod session;
#[cfg(feature = "test-support")]
pub mod test_support;
pub mod toolkit;
pub mod types;

pub use error::GatewayError;
pub use manager::{GatewayEvent, InitSummary, Manager, ManagerHandle};
pub use types::{AuthConfig, HttpParams, ServerInfo, ServerParams, StdioParams, ToolDescriptor, ToolSelection, Transport};
