// Bug tools: details, comments and commenting

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{CallToolResult, ToolSchema};
use crate::scope;
use crate::tools::{
    json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string,
    parse_arguments, Tool, ToolContext,
};
use bugzilla_sdk::NewComment;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Tool to fetch every field of a bug
pub struct BugInfoTool;

#[derive(Debug, Deserialize)]
struct BugInfoArgs {
    id: u64,
}

#[async_trait::async_trait]
impl Tool for BugInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "bug_info".to_string(),
            description: "Returns the entire information about a given bugzilla bug id".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "id": json_schema_integer("The bug id")
                }),
                vec!["id"],
            ),
        }
    }

    async fn execute(&self, _ctx: &ToolContext<'_>, arguments: Value) -> GatewayResult<CallToolResult> {
        let args: BugInfoArgs = parse_arguments("bug_info", arguments)?;
        info!(id = args.id, "bug_info");

        let client = scope::current()?;
        let bug = client
            .bugs()
            .get(args.id)
            .await
            .map_err(|e| GatewayError::from(e).context("Failed to fetch bug info"))?;

        Ok(CallToolResult::json(bug))
    }
}

/// Tool to list the comments of a bug
pub struct BugCommentsTool;

#[derive(Debug, Deserialize)]
struct BugCommentsArgs {
    id: u64,
    #[serde(default)]
    include_private_comments: bool,
}

#[async_trait::async_trait]
impl Tool for BugCommentsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "bug_comments".to_string(),
            description: "Returns the comments of given bug id. Private comments are not included \
                          by default but can be explicitly requested"
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "id": json_schema_integer("The bug id"),
                    "include_private_comments": json_schema_boolean("Include private comments (default: false)")
                }),
                vec!["id"],
            ),
        }
    }

    async fn execute(&self, _ctx: &ToolContext<'_>, arguments: Value) -> GatewayResult<CallToolResult> {
        let args: BugCommentsArgs = parse_arguments("bug_comments", arguments)?;
        info!(
            id = args.id,
            include_private_comments = args.include_private_comments,
            "bug_comments"
        );

        let client = scope::current()?;
        let all_comments = client
            .bugs()
            .comments(args.id)
            .await
            .map_err(|e| GatewayError::from(e).context("Failed to fetch bug comments"))?;

        let comments: Vec<Value> = if args.include_private_comments {
            all_comments
        } else {
            all_comments
                .into_iter()
                .filter(|c| !c.get("is_private").and_then(Value::as_bool).unwrap_or(false))
                .collect()
        };
        info!(count = comments.len(), "Returning comments");

        Ok(CallToolResult::json(Value::Array(comments)))
    }
}

/// Tool to post a comment on a bug
pub struct AddCommentTool;

#[derive(Debug, Deserialize)]
struct AddCommentArgs {
    bug_id: u64,
    comment: String,
    #[serde(default)]
    is_private: bool,
}

#[async_trait::async_trait]
impl Tool for AddCommentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "add_comment".to_string(),
            description: "Add a comment to a bug. It can optionally be private. If success, \
                          returns the created comment id."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "bug_id": json_schema_integer("The bug id"),
                    "comment": json_schema_string("Comment text"),
                    "is_private": json_schema_boolean("Make the comment private (default: false)")
                }),
                vec!["bug_id", "comment"],
            ),
        }
    }

    async fn execute(&self, _ctx: &ToolContext<'_>, arguments: Value) -> GatewayResult<CallToolResult> {
        let args: AddCommentArgs = parse_arguments("add_comment", arguments)?;
        if args.comment.trim().is_empty() {
            return Err(GatewayError::Validation("comment must not be empty".to_string()));
        }
        info!(bug_id = args.bug_id, is_private = args.is_private, "add_comment");

        let client = scope::current()?;
        let created = client
            .bugs()
            .add_comment(
                args.bug_id,
                &NewComment {
                    comment: args.comment,
                    is_private: args.is_private,
                },
            )
            .await
            .map_err(|e| GatewayError::from(e).context("Failed to create a comment"))?;

        Ok(CallToolResult::json(serde_json::json!({ "id": created.id })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::credential::{Credential, RequestHeaders};
    use crate::scope::ClientScope;
    use bugzilla_sdk::RetryPolicy;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scope_for(server: &MockServer) -> ClientScope {
        let mut config = ServerConfig::new(&server.uri()).unwrap();
        config.retry_policy = RetryPolicy::no_retry();
        ClientScope::new(Arc::new(config)).unwrap()
    }

    async fn run(server: &MockServer, tool: &dyn Tool, arguments: Value) -> GatewayResult<CallToolResult> {
        let headers = RequestHeaders::new();
        let ctx = ToolContext { headers: &headers };
        scope_for(server)
            .enter(Credential::new("secret_key"), tool.execute(&ctx, arguments))
            .await?
    }

    async fn mount_comments(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/rest/bug/42/comment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bugs": {"42": {"comments": [
                    {"id": 1, "text": "public", "is_private": false},
                    {"id": 2, "text": "hidden", "is_private": true},
                    {"id": 3, "text": "no flag"}
                ]}}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_private_comments_filtered_by_default() {
        let server = MockServer::start().await;
        mount_comments(&server).await;

        let result = run(&server, &BugCommentsTool, json!({"id": 42})).await.unwrap();
        let ids: Vec<_> = result.structured_content.unwrap()["result"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_private_comments_on_request() {
        let server = MockServer::start().await;
        mount_comments(&server).await;

        let result = run(
            &server,
            &BugCommentsTool,
            json!({"id": 42, "include_private_comments": true}),
        )
        .await
        .unwrap();
        assert_eq!(
            result.structured_content.unwrap()["result"].as_array().unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn test_bug_info_not_found_carries_context() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/bug/7"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": true, "code": 101, "message": "Bug #7 does not exist."
            })))
            .expect(1)
            .mount(&server)
            .await;

        match run(&server, &BugInfoTool, json!({"id": 7})).await {
            Err(GatewayError::Tool {
                message,
                status,
                attempts,
            }) => {
                assert!(message.starts_with("Failed to fetch bug info\nReason: "));
                assert!(message.contains("Bug #7 does not exist."));
                assert_eq!(status, Some(404));
                assert_eq!(attempts, 1);
            }
            other => panic!("Expected Tool error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_comment_rejected_before_any_call() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = run(&server, &AddCommentTool, json!({"bug_id": 1, "comment": "  "}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_tool_outside_scope_is_internal_error() {
        let headers = RequestHeaders::new();
        let ctx = ToolContext { headers: &headers };

        let err = BugInfoTool.execute(&ctx, json!({"id": 1})).await.unwrap_err();
        assert!(matches!(err, GatewayError::Internal(_)));
    }
}
