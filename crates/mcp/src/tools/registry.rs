// MCP tool trait and registry

use crate::credential::RequestHeaders;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{CallToolResult, ToolSchema};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-invocation data a tool may look at.
pub struct ToolContext<'a> {
    pub headers: &'a RequestHeaders,
}

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    ///
    /// Tools that need Bugzilla reach the request's client through
    /// [`crate::scope::current`].
    async fn execute(&self, ctx: &ToolContext<'_>, arguments: serde_json::Value)
        -> GatewayResult<CallToolResult>;

    /// Whether the tool talks to Bugzilla and therefore needs the caller's key.
    fn requires_credential(&self) -> bool {
        true
    }
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<_> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize tool arguments; absent arguments count as `{}`.
pub fn parse_arguments<T: DeserializeOwned>(
    tool: &str,
    arguments: serde_json::Value,
) -> GatewayResult<T> {
    let arguments = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| GatewayError::Validation(format!("Invalid arguments for {tool}: {e}")))
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 0,
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Args {
        id: u64,
        #[serde(default)]
        flag: bool,
    }

    #[test]
    fn test_parse_arguments() {
        let args: Args = parse_arguments("t", serde_json::json!({"id": 5})).unwrap();
        assert_eq!(args.id, 5);
        assert!(!args.flag);
    }

    #[test]
    fn test_parse_arguments_rejects_bad_input() {
        let err = parse_arguments::<Args>("bug_info", serde_json::json!({"id": "abc"}))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(err.to_string().starts_with("Invalid arguments for bug_info"));

        let missing = parse_arguments::<Args>("bug_info", serde_json::Value::Null).unwrap_err();
        assert!(matches!(missing, GatewayError::Validation(_)));
    }

    #[test]
    fn test_registry_lookup() {
        use crate::tools::{QuicksearchSyntaxTool, ServerUrlTool};

        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(ServerUrlTool::new("https://bugzilla.example.com")));
        registry.register(Arc::new(QuicksearchSyntaxTool));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("server_url_resource"));
        assert!(registry.contains("quicksearch_syntax_resource"));
        assert!(!registry.contains("bug_info"));
        assert!(registry.get("bug_info").is_none());

        let names: Vec<_> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["quicksearch_syntax_resource", "server_url_resource"]);
    }

    #[test]
    fn test_schema_helpers() {
        let schema = json_schema_object(
            serde_json::json!({"id": json_schema_integer("Bug id")}),
            vec!["id"],
        );
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["id"]["type"], "integer");
        assert_eq!(schema["required"][0], "id");
    }
}
