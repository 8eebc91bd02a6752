//! The Re-exporter (C6): hosts the local Manager and Agent as an MCP peer other gateways can
//! consume. See [`reexporter::Reexporter`] for the tool table and [`http::serve`] for hosting.

pub mod http;
pub mod reexporter;
