//! Toolkit adapter (C2): a filtered, bind-time snapshot of one session's tool catalog, suitable
//! for handing to an LLM agent. The sole object an agent sees — it carries `name`, `description`,
//! and `inputSchema` for every exposed tool even if the underlying session is later re-enumerated.

use crate::error::GatewayError;
use crate::manager::ManagerHandle;
use crate::types::ToolDescriptor;
use rmcp::model::CallToolResult;
use serde_json::{Map as JsonMap, Value};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A filterable, callable view of one server's tools (§3, §4.2).
#[derive(Clone)]
pub struct Toolkit {
    server_name: String,
    allowed_names: Option<HashSet<String>>,
    tools: Vec<ToolDescriptor>,
    manager: ManagerHandle,
}

impl Toolkit {
    /// Builds a Toolkit from a session's live catalog and an optional allow-list. The
    /// intersection is computed once, here, at bind time — mutating the returned Toolkit's
    /// allow-list afterward (it has none to mutate; it is a plain snapshot) cannot affect the
    /// session, satisfying invariant 3.
    pub(crate) fn new(
        server_name: impl Into<String>,
        allowed_names: Option<Vec<String>>,
        live_catalog: &[ToolDescriptor],
        manager: ManagerHandle,
    ) -> Self {
        let server_name = server_name.into();
        let allowed_set: Option<HashSet<String>> = allowed_names.map(|names| names.into_iter().map(|n| n.trim().to_string()).collect());

        let tools = match &allowed_set {
            None => live_catalog.to_vec(),
            Some(set) => live_catalog.iter().filter(|t| set.contains(t.name.trim())).cloned().collect(),
        };

        Self {
            server_name,
            allowed_names: allowed_set,
            tools,
            manager,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn allowed_names(&self) -> Option<&HashSet<String>> {
        self.allowed_names.as_ref()
    }

    /// Invokes a tool by name, validating `arguments` against the tool's declared input schema
    /// before touching transport (§4.2: schema validation failure fails with `InvalidArgs`).
    pub async fn invoke(
        &self,
        name: &str,
        arguments: JsonMap<String, Value>,
        deadline: Duration,
        cancel: CancellationToken,
    ) -> Result<CallToolResult, GatewayError> {
        let descriptor = self
            .tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| GatewayError::invalid_args(&self.server_name, name, "tool not present in this toolkit"))?;

        validate_arguments(&self.server_name, descriptor, &arguments)?;

        let manager = self
            .manager
            .upgrade()
            .ok_or_else(|| GatewayError::not_found(&self.server_name))?;

        manager.call_tool(&self.server_name, name, arguments, deadline, cancel).await
    }
}

/// Shallow validation against a JSON Schema fragment: required fields present, primitive types
/// match. Anything beyond that (nested shapes, formats) is left to the upstream server.
fn validate_arguments(server_name: &str, descriptor: &ToolDescriptor, arguments: &JsonMap<String, Value>) -> Result<(), GatewayError> {
    let schema = &descriptor.input_schema;
    let Some(schema_obj) = schema.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        for field in required {
            let Some(field_name) = field.as_str() else { continue };
            if !arguments.contains_key(field_name) {
                return Err(GatewayError::invalid_args(
                    server_name,
                    &descriptor.name,
                    format!("missing required field '{field_name}'"),
                ));
            }
        }
    }

    if let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) {
        for (field_name, field_schema) in properties {
            let Some(value) = arguments.get(field_name) else { continue };
            let Some(expected_type) = field_schema.get("type").and_then(Value::as_str) else {
                continue;
            };
            if !json_type_matches(expected_type, value) {
                return Err(GatewayError::invalid_args(
                    server_name,
                    &descriptor.name,
                    format!("field '{field_name}' expected type '{expected_type}'"),
                ));
            }
        }
    }

    Ok(())
}

fn json_type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(schema: Value) -> ToolDescriptor {
        ToolDescriptor {
            name: "t".into(),
            description: None,
            input_schema: schema,
            server_name: "srv".into(),
        }
    }

    #[test]
    fn missing_required_field_is_invalid() {
        let d = descriptor(json!({"type":"object","required":["path"],"properties":{"path":{"type":"string"}}}));
        let args = JsonMap::new();
        assert!(validate_arguments("srv", &d, &args).is_err());
    }

    #[test]
    fn type_mismatch_is_invalid() {
        let d = descriptor(json!({"type":"object","properties":{"count":{"type":"integer"}}}));
        let mut args = JsonMap::new();
        args.insert("count".into(), json!("not-a-number"));
        assert!(validate_arguments("srv", &d, &args).is_err());
    }

    #[test]
    fn valid_arguments_pass() {
        let d = descriptor(json!({"type":"object","required":["path"],"properties":{"path":{"type":"string"}}}));
        let mut args = JsonMap::new();
        args.insert("path".into(), json!("/tmp"));
        assert!(validate_arguments("srv", &d, &args).is_ok());
    }

    #[test]
    fn allow_list_intersection_is_trimmed_and_case_sensitive() {
        let catalog = vec![
            ToolDescriptor {
                name: "read_file".into(),
                description: None,
                input_schema: json!({}),
                server_name: "srv".into(),
            },
            ToolDescriptor {
                name: "write_file".into(),
                description: None,
                input_schema: json!({}),
                server_name: "srv".into(),
            },
        ];
        let manager = ManagerHandle::none();
        let toolkit = Toolkit::new("srv", Some(vec![" read_file ".to_string(), "Read_File".to_string()]), &catalog, manager);
        assert_eq!(toolkit.tools().len(), 1);
        assert_eq!(toolkit.tools()[0].name, "read_file");
    }

    #[test]
    fn empty_intersection_yields_zero_tools() {
        let catalog = vec![ToolDescriptor {
            name: "read_file".into(),
            description: None,
            input_schema: json!({}),
            server_name: "srv".into(),
        }];
        let manager = ManagerHandle::none();
        let toolkit = Toolkit::new("srv", Some(vec!["nonexistent".to_string()]), &catalog, manager);
        assert!(toolkit.tools().is_empty());
    }

    #[test]
    fn absent_allow_list_means_entire_catalog() {
        let catalog = vec![ToolDescriptor {
            name: "read_file".into(),
            description: None,
            input_schema: json!({}),
            server_name: "srv".into(),
        }];
        let manager = ManagerHandle::none();
        let toolkit = Toolkit::new("srv", None, &catalog, manager);
        assert_eq!(toolkit.tools().len(), 1);
    }
}
