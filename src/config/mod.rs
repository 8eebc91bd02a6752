//! Params loader (C3): parses the catalog file into validated [`ServerParams`], with defaulting,
//! placeholder interpolation, and validation. Grounded on the teacher's `config::mod`
//! (`default_config_path`, `load_config`) for file resolution conventions.

pub mod interpolation;
pub mod model;
pub mod validation;

use crate::error::GatewayError;
use crate::types::{AuthConfig, HttpParams, ServerParams, StdioParams, Transport};
use model::{CatalogDocument, RawAuthEntry, RawServerEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Manager-wide default for `timeoutSeconds` when a server entry omits it.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Parses a catalog document's bytes into validated, defaulted [`ServerParams`], keyed by name.
///
/// Pure: performs no I/O and touches no global state, per §4.3.
pub fn parse_catalog(json: &str, base_path: &str) -> Result<HashMap<String, ServerParams>, GatewayError> {
    let doc: CatalogDocument =
        serde_json::from_str(json).map_err(|e| GatewayError::invalid_config("<catalog>", format!("malformed catalog json: {e}")))?;

    let mut servers = HashMap::with_capacity(doc.mcp_servers.len());
    for (name, raw) in doc.mcp_servers {
        let params = resolve_entry(&name, raw, base_path)?;
        validation::validate_server(&params)?;
        servers.insert(name, params);
    }
    Ok(servers)
}

fn resolve_entry(name: &str, raw: RawServerEntry, base_path: &str) -> Result<ServerParams, GatewayError> {
    let transport = match raw.transport.as_deref() {
        Some("stdio") => Transport::Stdio,
        Some("http") => Transport::Http,
        Some(other) => {
            return Err(GatewayError::invalid_config(name, format!("unknown transport type '{other}'")));
        }
        None if raw.command.is_some() => Transport::Stdio,
        None => {
            return Err(GatewayError::invalid_config(
                name,
                "missing 'type' and no 'command' to infer stdio from",
            ));
        }
    };

    let enabled = raw.enabled.unwrap_or(true);
    let timeout_seconds = raw.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

    let (stdio, http) = match transport {
        Transport::Stdio => {
            let command = raw
                .command
                .ok_or_else(|| GatewayError::invalid_config(name, "stdio server requires 'command'"))?;
            let env: Vec<(String, String)> = raw
                .env
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, interpolation::interpolate_value(&v, base_path)))
                .collect();
            (
                Some(StdioParams {
                    command,
                    args: raw.args.unwrap_or_default(),
                    env,
                }),
                None,
            )
        }
        Transport::Http => {
            let url = raw
                .url
                .ok_or_else(|| GatewayError::invalid_config(name, "http server requires 'url'"))?;
            let auth = raw
                .auth
                .map(|a| -> Result<AuthConfig, GatewayError> {
                    match a.scheme.as_str() {
                        "bearer" => Ok(AuthConfig::Bearer { token: a.token }),
                        "api_key" => Ok(AuthConfig::ApiKey {
                            token: a.token,
                            header_name: a.header_name,
                        }),
                        other => Err(GatewayError::invalid_config(name, format!("unknown auth type '{other}'"))),
                    }
                })
                .transpose()?;
            (None, Some(HttpParams { url, auth }))
        }
    };

    Ok(ServerParams {
        name: name.to_string(),
        transport,
        enabled,
        timeout_seconds,
        description: raw.description,
        stdio,
        http,
    })
}

/// Serializes validated, defaulted [`ServerParams`] back into the catalog's wire shape — the
/// inverse of `parse_catalog`/`resolve_entry`. Every field `resolve_entry` defaults (`enabled`,
/// `timeout_seconds`, inferred `transport`) is written out explicitly, so re-parsing the result
/// reproduces the same `ServerParams` (§8 property 1's "modulo default insertion", property 11).
pub fn to_catalog_document(servers: &HashMap<String, ServerParams>) -> CatalogDocument {
    let mcp_servers = servers.iter().map(|(name, params)| (name.clone(), to_raw_entry(params))).collect();
    CatalogDocument { mcp_servers }
}

fn to_raw_entry(params: &ServerParams) -> RawServerEntry {
    let (command, args, env) = match &params.stdio {
        Some(stdio) => (Some(stdio.command.clone()), Some(stdio.args.clone()), Some(stdio.env.iter().cloned().collect())),
        None => (None, None, None),
    };
    let (url, auth) = match &params.http {
        Some(http) => (Some(http.url.clone()), http.auth.as_ref().map(to_raw_auth)),
        None => (None, None),
    };

    RawServerEntry {
        transport: Some(params.transport.to_string()),
        enabled: Some(params.enabled),
        timeout_seconds: Some(params.timeout_seconds),
        description: params.description.clone(),
        command,
        args,
        env,
        url,
        auth,
    }
}

fn to_raw_auth(auth: &AuthConfig) -> RawAuthEntry {
    match auth {
        AuthConfig::Bearer { token } => RawAuthEntry {
            scheme: "bearer".to_string(),
            token: token.clone(),
            header_name: None,
        },
        AuthConfig::ApiKey { token, header_name } => RawAuthEntry {
            scheme: "api_key".to_string(),
            token: token.clone(),
            header_name: header_name.clone(),
        },
    }
}

/// Resolves the default catalog path: `MCP_CONFIG_PATH` (tilde-expanded) when set, else
/// `dirs_next::config_dir().join("mcp-gateway").join("mcp.json")`.
pub fn default_catalog_path() -> PathBuf {
    if let Ok(raw) = std::env::var("MCP_CONFIG_PATH") {
        return expand_tilde(&raw);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mcp-gateway")
        .join("mcp.json")
}

fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Loads the catalog from `path`. A missing file loads as an empty catalog rather than erroring.
pub async fn load_catalog_from_path(path: &Path, base_path: &str) -> Result<HashMap<String, ServerParams>, GatewayError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => parse_catalog(&contents, base_path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(GatewayError::invalid_config(
            "<catalog>",
            format!("failed to read catalog at {}: {e}", path.display()),
        )),
    }
}

/// Loads the catalog from the default path (see [`default_catalog_path`]).
pub async fn load_catalog(base_path: &str) -> Result<HashMap<String, ServerParams>, GatewayError> {
    load_catalog_from_path(&default_catalog_path(), base_path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_transport_to_stdio_when_command_present() {
        let json = r#"{"mcpServers":{"fs":{"command":"echo-mcp"}}}"#;
        let servers = parse_catalog(json, "/base").unwrap();
        assert_eq!(servers["fs"].transport, Transport::Stdio);
        assert!(servers["fs"].enabled);
        assert_eq!(servers["fs"].timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn missing_transport_without_command_is_invalid() {
        let json = r#"{"mcpServers":{"fs":{}}}"#;
        assert!(parse_catalog(json, "/base").is_err());
    }

    #[test]
    fn disabled_entries_are_retained() {
        let json = r#"{"mcpServers":{"fs":{"type":"stdio","command":"echo-mcp","enabled":false}}}"#;
        let servers = parse_catalog(json, "/base").unwrap();
        assert!(!servers["fs"].enabled);
    }

    #[test]
    fn base_path_placeholder_is_interpolated_in_env() {
        let json = r#"{"mcpServers":{"fs":{"type":"stdio","command":"echo-mcp","env":{"ROOT":"{BASE_PATH}/data"}}}}"#;
        let servers = parse_catalog(json, "/srv/app").unwrap();
        let env = &servers["fs"].stdio.as_ref().unwrap().env;
        assert_eq!(env[0], ("ROOT".to_string(), "/srv/app/data".to_string()));
    }

    #[test]
    fn http_entry_parses_bearer_auth() {
        let json = r#"{"mcpServers":{"peer":{"type":"http","url":"http://stub/mcp","auth":{"type":"bearer","token":"t"}}}}"#;
        let servers = parse_catalog(json, "/base").unwrap();
        assert_eq!(servers["peer"].http.as_ref().unwrap().auth, Some(AuthConfig::Bearer { token: "t".into() }));
    }

    #[tokio::test]
    async fn missing_catalog_file_loads_empty() {
        let missing = PathBuf::from("/tmp/does-not-exist-mcp-gateway-catalog.json");
        let servers = load_catalog_from_path(&missing, "/base").await.unwrap();
        assert!(servers.is_empty());
    }

    #[test]
    fn default_path_honors_env_override() {
        temp_env::with_var("MCP_CONFIG_PATH", Some("/custom/mcp.json"), || {
            assert_eq!(default_catalog_path(), PathBuf::from("/custom/mcp.json"));
        });
    }

    #[test]
    fn serialized_catalog_makes_defaults_explicit() {
        let json = r#"{"mcpServers":{"fs":{"command":"echo-mcp"}}}"#;
        let servers = parse_catalog(json, "/base").unwrap();

        let doc = to_catalog_document(&servers);
        let value = serde_json::to_value(&doc).unwrap();
        let fs = &value["mcpServers"]["fs"];
        assert_eq!(fs["type"], serde_json::json!("stdio"));
        assert_eq!(fs["enabled"], serde_json::json!(true));
        assert_eq!(fs["timeout_seconds"], serde_json::json!(DEFAULT_TIMEOUT_SECONDS));
    }

    #[test]
    fn catalog_round_trips_through_serialization() {
        let json = r#"{"mcpServers":{
            "fs":{"command":"echo-mcp","args":["--root","/tmp"]},
            "peer":{"type":"http","url":"http://stub/mcp","auth":{"type":"bearer","token":"t"}}
        }}"#;
        let servers = parse_catalog(json, "/base").unwrap();

        let doc = to_catalog_document(&servers);
        let reserialized = serde_json::to_string(&doc).unwrap();
        let reparsed = parse_catalog(&reserialized, "/base").unwrap();

        assert_eq!(reparsed, servers);
    }
}
