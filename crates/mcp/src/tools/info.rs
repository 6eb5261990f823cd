// Informational tools. None of them talk to Bugzilla.

use crate::config::ServerConfig;
use crate::error::GatewayResult;
use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{json_schema_integer, json_schema_object, parse_arguments, Tool, ToolContext};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Tool building the web URL of a bug
pub struct BugUrlTool {
    base_url: String,
}

impl BugUrlTool {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BugUrlArgs {
    bug_id: u64,
}

#[async_trait::async_trait]
impl Tool for BugUrlTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "bug_url".to_string(),
            description: "returns the bug url".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "bug_id": json_schema_integer("The bug id")
                }),
                vec!["bug_id"],
            ),
        }
    }

    async fn execute(&self, _ctx: &ToolContext<'_>, arguments: Value) -> GatewayResult<CallToolResult> {
        let args: BugUrlArgs = parse_arguments("bug_url", arguments)?;
        info!(bug_id = args.bug_id, "bug_url");
        Ok(CallToolResult::text(format!(
            "{}/show_bug.cgi?id={}",
            self.base_url, args.bug_id
        )))
    }

    fn requires_credential(&self) -> bool {
        false
    }
}

/// Tool returning the Bugzilla base URL
pub struct ServerUrlTool {
    base_url: String,
}

impl ServerUrlTool {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for ServerUrlTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "server_url_resource".to_string(),
            description: "bugzilla server's base url".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _ctx: &ToolContext<'_>, _arguments: Value) -> GatewayResult<CallToolResult> {
        info!("server_url_resource");
        Ok(CallToolResult::text(self.base_url.clone()))
    }

    fn requires_credential(&self) -> bool {
        false
    }
}

/// Tool describing the running gateway
pub struct ServerInfoTool {
    config: Arc<ServerConfig>,
    started_at: DateTime<Utc>,
}

impl ServerInfoTool {
    pub fn new(config: Arc<ServerConfig>, started_at: DateTime<Utc>) -> Self {
        Self { config, started_at }
    }
}

#[async_trait::async_trait]
impl Tool for ServerInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "mcp_server_info_resource".to_string(),
            description: "Returns the args being used by the current server instance".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _ctx: &ToolContext<'_>, _arguments: Value) -> GatewayResult<CallToolResult> {
        info!("mcp_server_info_resource");

        let mut described = self.config.describe();
        if let Some(fields) = described.as_object_mut() {
            fields.insert("version".to_string(), env!("CARGO_PKG_VERSION").into());
            fields.insert("started_at".to_string(), self.started_at.to_rfc3339().into());
        }
        Ok(CallToolResult::json(described))
    }

    fn requires_credential(&self) -> bool {
        false
    }
}

/// Tool echoing the inbound request headers, credential masked
pub struct CurrentHeadersTool {
    credential_header: String,
}

impl CurrentHeadersTool {
    pub fn new(credential_header: impl Into<String>) -> Self {
        Self {
            credential_header: credential_header.into(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CurrentHeadersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_headers_resource".to_string(),
            description: "Returns the headers being provided by the current http request"
                .to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, ctx: &ToolContext<'_>, _arguments: Value) -> GatewayResult<CallToolResult> {
        info!(count = ctx.headers.len(), "get_current_headers_resource");
        let headers = ctx.headers.redacted(&self.credential_header);
        Ok(CallToolResult::json(serde_json::json!(headers)))
    }

    fn requires_credential(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::RequestHeaders;
    use serde_json::json;

    #[tokio::test]
    async fn test_bug_url() {
        let headers = RequestHeaders::new();
        let ctx = ToolContext { headers: &headers };
        let tool = BugUrlTool::new("https://bugzilla.example.com");

        let result = tool.execute(&ctx, json!({"bug_id": 12345})).await.unwrap();
        assert_eq!(
            result.content[0].as_text(),
            "https://bugzilla.example.com/show_bug.cgi?id=12345"
        );
        assert!(!tool.requires_credential());
    }

    #[tokio::test]
    async fn test_server_info_has_version_and_start() {
        let config = Arc::new(ServerConfig::new("https://bugzilla.example.com").unwrap());
        let tool = ServerInfoTool::new(config, Utc::now());
        let headers = RequestHeaders::new();
        let ctx = ToolContext { headers: &headers };

        let info = tool
            .execute(&ctx, Value::Null)
            .await
            .unwrap()
            .structured_content
            .unwrap();
        assert_eq!(info["bugzilla_server"], "https://bugzilla.example.com");
        assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
        assert!(info["started_at"].is_string());
    }

    #[tokio::test]
    async fn test_headers_mask_credential() {
        let headers = RequestHeaders::from_pairs([("ApiKey", "secret_key"), ("Accept", "*/*")]);
        let ctx = ToolContext { headers: &headers };
        let tool = CurrentHeadersTool::new("ApiKey");

        let result = tool.execute(&ctx, json!({})).await.unwrap();
        let shown = result.structured_content.unwrap();

        assert_eq!(shown["apikey"], "<redacted>");
        assert_eq!(shown["accept"], "*/*");
        assert!(!result.content[0].as_text().contains("secret_key"));
    }
}
