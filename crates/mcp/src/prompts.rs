//! MCP prompts and their registry.

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{GetPromptResult, PromptArgument, PromptMessage, PromptSchema};
use crate::scope;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Prompt renderer trait
#[async_trait::async_trait]
pub trait Prompt: Send + Sync {
    fn schema(&self) -> PromptSchema;

    async fn render(&self, arguments: Map<String, Value>) -> GatewayResult<GetPromptResult>;

    fn requires_credential(&self) -> bool {
        true
    }
}

/// Prompt registry, keyed by prompt name
#[derive(Default)]
pub struct PromptRegistry {
    prompts: HashMap<String, Arc<dyn Prompt>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, prompt: Arc<dyn Prompt>) {
        let schema = prompt.schema();
        self.prompts.insert(schema.name, prompt);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Prompt>> {
        self.prompts.get(name).cloned()
    }

    /// All prompt schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<PromptSchema> {
        let mut schemas: Vec<_> = self.prompts.values().map(|p| p.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

const SUMMARY_INSTRUCTIONS: &str = "You are an expert in summarizing bugzilla comments.
Rules to follow:
- Summary must be well structured & eye catching
- Mention usernames & dates wherever relevant.
- date field must be in human readable format
- Usernames must be bold italic (***username***) dates must be bold (**date**)

Comments Data:
";

/// Summarisation instructions over all comments of a bug
pub struct SummarizeBugPrompt;

#[async_trait::async_trait]
impl Prompt for SummarizeBugPrompt {
    fn schema(&self) -> PromptSchema {
        PromptSchema {
            name: "summarize_bug_prompt".to_string(),
            description: "Summarizes all the comments of a bug".to_string(),
            arguments: vec![PromptArgument {
                name: "id".to_string(),
                description: "The bug id".to_string(),
                required: true,
            }],
        }
    }

    async fn render(&self, arguments: Map<String, Value>) -> GatewayResult<GetPromptResult> {
        let id = bug_id_argument(&arguments)?;
        info!(id, "summarize_bug_prompt");

        let client = scope::current()?;
        let comments = client
            .bugs()
            .comments(id)
            .await
            .map_err(|e| GatewayError::from(e).context("Summarize Comments Failed"))?;

        let data = serde_json::to_string_pretty(&comments)
            .map_err(|e| GatewayError::Internal(format!("failed to serialize comments: {e}")))?;
        let text = format!("{SUMMARY_INSTRUCTIONS}{data}");
        info!(length = text.len(), "Generated summary prompt");

        Ok(GetPromptResult {
            description: Some(format!("Summary of the comments of bug {id}")),
            messages: vec![PromptMessage::user(text)],
        })
    }
}

// Prompt arguments are strings on the wire; numbers are accepted too.
fn bug_id_argument(arguments: &Map<String, Value>) -> GatewayResult<u64> {
    let invalid = || GatewayError::Validation("`id` must be a bug number".to_string());
    match arguments.get("id") {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
        None => Err(GatewayError::Validation("`id` argument is required".to_string())),
    }
}
