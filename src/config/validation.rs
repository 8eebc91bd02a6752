//! Server-name and per-transport field validation (§4.3), ported from the teacher's
//! `config::validation` module and adapted to return `GatewayError::InvalidConfig`.

use crate::error::GatewayError;
use crate::types::ServerParams;
use once_cell::sync::Lazy;
use regex::Regex;

static SERVER_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9._-]+$").unwrap());
static ENV_KEY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*$").unwrap());

/// Validates a server name against the catalog's identifier convention.
pub fn validate_server_name(name: &str) -> Result<(), GatewayError> {
    if name.trim().is_empty() {
        return Err(GatewayError::invalid_config(name, "server name must not be empty"));
    }
    if !SERVER_NAME_PATTERN.is_match(name) {
        return Err(GatewayError::invalid_config(
            name,
            "server name must match ^[a-z0-9._-]+$",
        ));
    }
    Ok(())
}

/// Validates the fully-resolved params for one server, dispatching on transport.
pub fn validate_server(params: &ServerParams) -> Result<(), GatewayError> {
    validate_server_name(&params.name)?;

    match params.transport {
        crate::types::Transport::Stdio => validate_stdio(params),
        crate::types::Transport::Http => validate_http(params),
    }
}

fn validate_stdio(params: &ServerParams) -> Result<(), GatewayError> {
    let stdio = params
        .stdio
        .as_ref()
        .ok_or_else(|| GatewayError::invalid_config(&params.name, "stdio server missing stdio params"))?;

    if stdio.command.trim().is_empty() {
        return Err(GatewayError::invalid_config(&params.name, "stdio server requires a non-empty command"));
    }

    for (key, _) in &stdio.env {
        if !ENV_KEY_PATTERN.is_match(key) {
            return Err(GatewayError::invalid_config(
                &params.name,
                format!("invalid environment variable key '{key}'"),
            ));
        }
    }

    Ok(())
}

fn validate_http(params: &ServerParams) -> Result<(), GatewayError> {
    let http = params
        .http
        .as_ref()
        .ok_or_else(|| GatewayError::invalid_config(&params.name, "http server missing http params"))?;

    let parsed = url::Url::parse(&http.url)
        .map_err(|e| GatewayError::invalid_config(&params.name, format!("invalid url '{}': {e}", http.url)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(GatewayError::invalid_config(
            &params.name,
            format!("url scheme must be http or https, got '{}'", parsed.scheme()),
        ));
    }

    if let Some(auth) = &http.auth {
        if let crate::types::AuthConfig::ApiKey { header_name: Some(h), .. } = auth {
            if h.trim().is_empty() || h.chars().any(|c| c.is_control()) {
                return Err(GatewayError::invalid_config(&params.name, "invalid auth header name"));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HttpParams, StdioParams, Transport};

    fn stdio_params(name: &str, command: &str) -> ServerParams {
        ServerParams {
            name: name.into(),
            transport: Transport::Stdio,
            enabled: true,
            timeout_seconds: 60,
            description: None,
            stdio: Some(StdioParams {
                command: command.into(),
                args: vec![],
                env: vec![],
            }),
            http: None,
        }
    }

    #[test]
    fn valid_server_names_pass() {
        assert!(validate_server_name("fs").is_ok());
        assert!(validate_server_name("fs-01.test").is_ok());
    }

    #[test]
    fn invalid_server_names_fail() {
        assert!(validate_server_name("").is_err());
        assert!(validate_server_name("Has Spaces").is_err());
        assert!(validate_server_name("UPPER").is_err());
    }

    #[test]
    fn stdio_requires_non_empty_command() {
        let params = stdio_params("fs", "   ");
        assert!(matches!(validate_server(&params), Err(GatewayError::InvalidConfig { .. })));
    }

    #[test]
    fn stdio_rejects_bad_env_key() {
        let mut params = stdio_params("fs", "echo-mcp");
        params.stdio.as_mut().unwrap().env.push(("lower-case".into(), "v".into()));
        assert!(validate_server(&params).is_err());
    }

    #[test]
    fn http_requires_absolute_url() {
        let params = ServerParams {
            name: "peer".into(),
            transport: Transport::Http,
            enabled: true,
            timeout_seconds: 60,
            description: None,
            stdio: None,
            http: Some(HttpParams {
                url: "not-a-url".into(),
                auth: None,
            }),
        };
        assert!(validate_server(&params).is_err());
    }

    #[test]
    fn http_accepts_valid_https_url() {
        let params = ServerParams {
            name: "peer".into(),
            transport: Transport::Http,
            enabled: true,
            timeout_seconds: 60,
            description: None,
            stdio: None,
            http: Some(HttpParams {
                url: "https://example.com/mcp".into(),
                auth: None,
            }),
        };
        assert!(validate_server(&params).is_ok());
    }
}
