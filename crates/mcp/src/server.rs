// MCP request dispatcher

use crate::config::ServerConfig;
use crate::credential::{extract_credential, RequestHeaders};
use crate::error::{GatewayError, GatewayResult};
use crate::prompts::{Prompt, PromptRegistry, SummarizeBugPrompt};
use crate::protocol::*;
use crate::scope::{ClientScope, ScopeStats};
use crate::tools::*;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Stateless MCP endpoint for one Bugzilla instance.
///
/// Holds nothing per caller; each authenticated invocation gets its own
/// client through [`ClientScope`].
pub struct McpServer {
    config: Arc<ServerConfig>,
    tools: ToolRegistry,
    prompts: PromptRegistry,
    scope: ClientScope,
    started_at: DateTime<Utc>,
}

impl McpServer {
    /// Server with every built-in tool and prompt registered.
    pub fn new(config: ServerConfig) -> GatewayResult<Self> {
        let config = Arc::new(config);
        let started_at = Utc::now();

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(BugInfoTool));
        tools.register(Arc::new(BugCommentsTool));
        tools.register(Arc::new(AddCommentTool));
        tools.register(Arc::new(QuicksearchTool));
        tools.register(Arc::new(QuicksearchSyntaxTool));
        tools.register(Arc::new(BugUrlTool::new(config.bugzilla_server())));
        tools.register(Arc::new(ServerUrlTool::new(config.bugzilla_server())));
        tools.register(Arc::new(ServerInfoTool::new(config.clone(), started_at)));
        tools.register(Arc::new(CurrentHeadersTool::new(config.api_key_header.clone())));

        let mut prompts = PromptRegistry::new();
        prompts.register(Arc::new(SummarizeBugPrompt));

        Self::with_registries(config, tools, prompts, started_at)
    }

    pub fn with_registries(
        config: Arc<ServerConfig>,
        tools: ToolRegistry,
        prompts: PromptRegistry,
        started_at: DateTime<Utc>,
    ) -> GatewayResult<Self> {
        for name in config.disabled_methods.iter() {
            info!(method = name, "Method disabled by configuration");
        }
        info!(
            tools = tools.len(),
            prompts = prompts.len(),
            "Registered MCP methods"
        );

        Ok(Self {
            scope: ClientScope::new(config.clone())?,
            config,
            tools,
            prompts,
            started_at,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn scope_stats(&self) -> &Arc<ScopeStats> {
        self.scope.stats()
    }

    /// Handle one JSON-RPC message. Notifications yield no response.
    pub async fn handle(
        &self,
        request: JsonRpcRequest,
        headers: &RequestHeaders,
    ) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            let id = request.id.unwrap_or(Value::Null);
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification acknowledged");
            return None;
        };

        let result = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(request.params, headers).await,
            "prompts/list" => self.list_prompts(),
            "prompts/get" => self.get_prompt(request.params, headers).await,
            other => {
                debug!(method = other, "Unknown method");
                return Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::method_not_found(other),
                ));
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                if let GatewayError::Internal(detail) = &e {
                    error!(method = %request.method, detail = %detail, "Internal error");
                }
                JsonRpcResponse::error(id, e.to_jsonrpc())
            }
        })
    }

    fn initialize(&self, params: Option<Value>) -> GatewayResult<Value> {
        let params: InitializeParams = match params {
            Some(params) if !params.is_null() => parse_params(params)?,
            _ => InitializeParams::default(),
        };
        if let Some(client) = &params.client_info {
            info!(client = %client.name, version = %client.version, "MCP client connected");
        }

        let result = InitializeResult {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ListChangedCapability { list_changed: false }),
                prompts: Some(ListChangedCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "mcp-bugzilla".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        to_value(result)
    }

    fn list_tools(&self) -> GatewayResult<Value> {
        let tools = self
            .tools
            .list_schemas()
            .into_iter()
            .filter(|t| !self.config.disabled_methods.is_disabled(&t.name))
            .collect();
        to_value(ListToolsResult { tools })
    }

    fn list_prompts(&self) -> GatewayResult<Value> {
        let prompts = self
            .prompts
            .list_schemas()
            .into_iter()
            .filter(|p| !self.config.disabled_methods.is_disabled(&p.name))
            .collect();
        to_value(ListPromptsResult { prompts })
    }

    async fn call_tool(&self, params: Option<Value>, headers: &RequestHeaders) -> GatewayResult<Value> {
        let params: CallToolParams = parse_params(params.unwrap_or(Value::Null))?;
        self.config.disabled_methods.check(&params.name)?;

        let tool = self
            .tools
            .get(&params.name)
            .ok_or_else(|| GatewayError::Validation(format!("Unknown tool: {}", params.name)))?;

        let ctx = ToolContext { headers };
        let outcome = if tool.requires_credential() {
            let credential = extract_credential(headers, &self.config.api_key_header)?;
            info!(tool = %params.name, credential = %credential.fingerprint(), "Calling tool");
            let execution = tool.execute(&ctx, params.arguments);
            self.with_deadline(async { self.scope.enter(credential, execution).await? })
                .await
        } else {
            info!(tool = %params.name, "Calling tool");
            self.with_deadline(tool.execute(&ctx, params.arguments)).await
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) if e.is_execution_failure() => {
                warn!(tool = %params.name, error = %e, "Tool execution failed");
                CallToolResult::error(e.to_string())
            }
            Err(e) => return Err(e),
        };
        to_value(result)
    }

    async fn get_prompt(&self, params: Option<Value>, headers: &RequestHeaders) -> GatewayResult<Value> {
        let params: GetPromptParams = parse_params(params.unwrap_or(Value::Null))?;
        self.config.disabled_methods.check(&params.name)?;

        let prompt = self
            .prompts
            .get(&params.name)
            .ok_or_else(|| GatewayError::Validation(format!("Unknown prompt: {}", params.name)))?;

        let outcome = if prompt.requires_credential() {
            let credential = extract_credential(headers, &self.config.api_key_header)?;
            info!(prompt = %params.name, credential = %credential.fingerprint(), "Rendering prompt");
            let rendering = prompt.render(params.arguments);
            self.with_deadline(async { self.scope.enter(credential, rendering).await? })
                .await
        } else {
            self.with_deadline(prompt.render(params.arguments)).await
        };

        match outcome {
            Ok(result) => to_value(result),
            Err(e) => {
                warn!(prompt = %params.name, error = %e, "Prompt failed");
                Err(e)
            }
        }
    }

    /// Bound one invocation by the request timeout. Expiry drops the
    /// invocation, outstanding Bugzilla call included.
    async fn with_deadline<T>(&self, fut: impl Future<Output = GatewayResult<T>>) -> GatewayResult<T> {
        match tokio::time::timeout(self.config.request_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_ms = self.config.request_timeout.as_millis() as u64,
                    "Request deadline exceeded"
                );
                Err(GatewayError::deadline_exceeded())
            }
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> GatewayResult<T> {
    serde_json::from_value(params).map_err(|e| GatewayError::Validation(format!("Invalid params: {e}")))
}

fn to_value<T: serde::Serialize>(value: T) -> GatewayResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| GatewayError::Internal(format!("failed to serialize result: {e}")))
}
