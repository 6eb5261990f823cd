// Quicksearch tools

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::scope;
use crate::tools::{
    json_schema_integer, json_schema_object, json_schema_string, parse_arguments, Tool,
    ToolContext,
};
use bugzilla_sdk::QuickSearch;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Tool to search bugs with Bugzilla's quicksearch syntax
pub struct QuicksearchTool;

#[derive(Debug, Deserialize)]
struct QuicksearchArgs {
    query: String,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_status() -> String {
    "ALL".to_string()
}

fn default_limit() -> u32 {
    50
}

#[async_trait::async_trait]
impl Tool for QuicksearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "bugs_quicksearch".to_string(),
            description: "Search bugs using bugzilla's quicksearch syntax. To reduce the token \
                          limit & response time, only returns a subset of fields for each bug. \
                          The user can query full details of each bug using the bug_info tool"
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "query": json_schema_string("Quicksearch query, e.g. `product:Firefox crash`"),
                    "status": json_schema_string("Leading status filter (default: ALL)"),
                    "limit": json_schema_integer("Maximum number of bugs to return (default: 50)"),
                    "offset": json_schema_integer("Number of bugs to skip (default: 0)")
                }),
                vec!["query"],
            ),
        }
    }

    async fn execute(&self, _ctx: &ToolContext<'_>, arguments: Value) -> GatewayResult<CallToolResult> {
        let args: QuicksearchArgs = parse_arguments("bugs_quicksearch", arguments)?;
        info!(
            query = %args.query,
            status = %args.status,
            limit = args.limit,
            offset = args.offset,
            "bugs_quicksearch"
        );

        let search = QuickSearch {
            query: args.query,
            status: Some(args.status),
            limit: args.limit,
            offset: args.offset,
        };

        let client = scope::current()?;
        let bugs = client
            .bugs()
            .quicksearch(&search)
            .await
            .map_err(|e| GatewayError::from(e).context("Search failed"))?;
        info!(count = bugs.len(), "Quicksearch returned bugs");

        let bugs = serde_json::to_value(bugs)
            .map_err(|e| GatewayError::Internal(format!("failed to serialize bugs: {e}")))?;
        Ok(CallToolResult::json(bugs))
    }
}

/// Tool returning the quicksearch syntax documentation page
pub struct QuicksearchSyntaxTool;

#[async_trait::async_trait]
impl Tool for QuicksearchSyntaxTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "quicksearch_syntax_resource".to_string(),
            description: "Access the documentation of the bugzilla quicksearch syntax. \
                          LLM can learn using this tool. Response is in HTML"
                .to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
        }
    }

    async fn execute(&self, _ctx: &ToolContext<'_>, _arguments: Value) -> GatewayResult<CallToolResult> {
        let client = scope::current()?;
        let page = client
            .docs()
            .quicksearch_syntax()
            .await
            .map_err(|e| GatewayError::from(e).context("Couldn't fetch quicksearch documentation"))?;

        Ok(CallToolResult::text(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::credential::{Credential, RequestHeaders};
    use crate::scope::ClientScope;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn run(server: &MockServer, tool: &dyn Tool, arguments: Value) -> GatewayResult<CallToolResult> {
        let config = ServerConfig::new(&server.uri()).unwrap();
        let scope = ClientScope::new(Arc::new(config)).unwrap();
        let headers = RequestHeaders::new();
        let ctx = ToolContext { headers: &headers };
        scope
            .enter(Credential::new("secret_key"), tool.execute(&ctx, arguments))
            .await?
    }

    #[tokio::test]
    async fn test_quicksearch_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/bug"))
            .and(query_param("quicksearch", "ALL crash"))
            .and(query_param("limit", "50"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bugs": []})))
            .expect(1)
            .mount(&server)
            .await;

        let result = run(&server, &QuicksearchTool, json!({"query": "crash"}))
            .await
            .unwrap();
        assert_eq!(result.structured_content, Some(json!({"result": []})));
    }

    #[tokio::test]
    async fn test_quicksearch_custom_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/bug"))
            .and(query_param("quicksearch", "OPEN product:Core"))
            .and(query_param("limit", "5"))
            .and(query_param("offset", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"bugs": [{
                "id": 11,
                "product": "Core",
                "component": "DOM",
                "assigned_to": "dev@example.com",
                "status": "NEW",
                "resolution": "",
                "summary": "Crash on load",
                "last_change_time": "2025-01-02T03:04:05Z"
            }]})))
            .expect(1)
            .mount(&server)
            .await;

        let result = run(
            &server,
            &QuicksearchTool,
            json!({"query": "product:Core", "status": "OPEN", "limit": 5, "offset": 10}),
        )
        .await
        .unwrap();

        let bugs = &result.structured_content.unwrap()["result"];
        assert_eq!(bugs[0]["bug_id"], 11);
        assert_eq!(bugs[0]["last_updated"], "2025-01-02T03:04:05Z");
    }

    #[tokio::test]
    async fn test_quicksearch_requires_query() {
        let server = MockServer::start().await;
        let err = run(&server, &QuicksearchTool, json!({"status": "OPEN"}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_syntax_page_is_returned_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.cgi"))
            .and(query_param("id", "quicksearch.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>syntax</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let result = run(&server, &QuicksearchSyntaxTool, Value::Null).await.unwrap();
        assert_eq!(result.content[0].as_text(), "<html>syntax</html>");
        assert!(result.is_error.is_none());
    }
}
