//! Raw, wire-shaped representation of the catalog file (§6). This mirrors the JSON document
//! exactly; [`crate::config::load_catalog`] turns it into validated [`crate::types::ServerParams`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level catalog document: `{ "mcpServers": { "<name>": RawServerEntry } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default, rename = "mcpServers")]
    pub mcp_servers: HashMap<String, RawServerEntry>,
}

/// One entry in the catalog, as parsed directly from JSON before validation/defaulting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct RawServerEntry {
    #[serde(rename = "type", default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub auth: Option<RawAuthEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct RawAuthEntry {
    #[serde(rename = "type")]
    pub scheme: String,
    pub token: String,
    #[serde(default)]
    pub header_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_spec_style_document() {
        let json = r#"{
            "mcpServers": {
                "fs": {
                    "type": "stdio",
                    "command": "echo-mcp",
                    "args": ["--root", "/tmp"],
                    "timeout_seconds": 5
                },
                "peer": {
                    "type": "http",
                    "url": "http://stub/mcp",
                    "auth": { "type": "bearer", "token": "t" }
                }
            }
        }"#;

        let doc: CatalogDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.mcp_servers.len(), 2);
        let fs = &doc.mcp_servers["fs"];
        assert_eq!(fs.command.as_deref(), Some("echo-mcp"));
        assert_eq!(fs.args.as_ref().unwrap().len(), 2);

        let peer = &doc.mcp_servers["peer"];
        assert_eq!(peer.url.as_deref(), Some("http://stub/mcp"));
        assert_eq!(peer.auth.as_ref().unwrap().scheme, "bearer");
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = r#"{"mcpServers":{"x":{"type":"stdio","command":"c","bogus":1}}}"#;
        let result: Result<CatalogDocument, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
