//! Bug endpoints: details, comments and quicksearch.

use crate::client::BugzillaClient;
use crate::error::{BugzillaError, BugzillaResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Fields requested from Bugzilla for quicksearch results.
pub const QUICKSEARCH_FIELDS: &str =
    "id,product,component,assigned_to,status,resolution,summary,last_change_time";

/// Bugs API.
pub struct BugsApi<'a> {
    client: &'a BugzillaClient,
}

impl<'a> BugsApi<'a> {
    pub(crate) fn new(client: &'a BugzillaClient) -> Self {
        Self { client }
    }

    /// Fetch every field of a single bug.
    pub async fn get(&self, bug_id: u64) -> BugzillaResult<Value> {
        let response: BugsResponse = self.client.http.get(&format!("bug/{bug_id}")).await?;
        let bug = response.bugs.into_iter().next().ok_or_else(|| {
            BugzillaError::Parse(format!("bug {bug_id} missing from response"))
        })?;
        info!(bug_id, "Found bug");
        debug!(bug = %bug, "Bug details");
        Ok(bug)
    }

    /// Fetch all comments of a bug, private ones included.
    pub async fn comments(&self, bug_id: u64) -> BugzillaResult<Vec<Value>> {
        let mut response: CommentsResponse = self
            .client
            .http
            .get(&format!("bug/{bug_id}/comment"))
            .await?;
        let comments = response
            .bugs
            .remove(&bug_id.to_string())
            .map(|bug| bug.comments)
            .ok_or_else(|| {
                BugzillaError::Parse(format!("comments of bug {bug_id} missing from response"))
            })?;
        info!(bug_id, count = comments.len(), "Found comments");
        Ok(comments)
    }

    /// Post a comment to a bug.
    pub async fn add_comment(
        &self,
        bug_id: u64,
        comment: &NewComment,
    ) -> BugzillaResult<CommentCreated> {
        let created: CommentCreated = self
            .client
            .http
            .post(&format!("bug/{bug_id}/comment"), comment)
            .await?;
        info!(bug_id, comment_id = created.id, "Comment added");
        Ok(created)
    }

    /// Run a quicksearch and project each hit to [`BugSummary`].
    pub async fn quicksearch(&self, search: &QuickSearch) -> BugzillaResult<Vec<BugSummary>> {
        let response: SummariesResponse = self
            .client
            .http
            .get_with_query("bug", &search.to_query())
            .await?;
        info!(count = response.bugs.len(), "Found bugs");
        Ok(response.bugs)
    }
}

/// A comment to post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub comment: String,
    pub is_private: bool,
}

/// Response from posting a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCreated {
    pub id: u64,
}

/// Quicksearch parameters.
#[derive(Debug, Clone)]
pub struct QuickSearch {
    /// Query in Bugzilla's quicksearch syntax, forwarded verbatim.
    pub query: String,
    /// Leading status filter such as `ALL`, `OPEN` or `NEW`.
    pub status: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl QuickSearch {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            status: None,
            limit: 50,
            offset: 0,
        }
    }

    fn to_query(&self) -> Vec<(&'static str, String)> {
        let quicksearch = match self.status.as_deref().map(str::trim) {
            Some(status) if !status.is_empty() => format!("{status} {}", self.query),
            _ => self.query.clone(),
        };
        vec![
            ("quicksearch", quicksearch),
            ("include_fields", QUICKSEARCH_FIELDS.to_string()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ]
    }
}

/// Compact view of a bug returned by quicksearch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugSummary {
    #[serde(alias = "id")]
    pub bug_id: u64,
    pub product: String,
    pub component: String,
    pub assigned_to: String,
    pub status: String,
    pub resolution: String,
    pub summary: String,
    #[serde(alias = "last_change_time")]
    pub last_updated: String,
}

#[derive(Debug, Deserialize)]
struct BugsResponse {
    bugs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SummariesResponse {
    bugs: Vec<BugSummary>,
}

#[derive(Debug, Deserialize)]
struct CommentsResponse {
    bugs: HashMap<String, BugComments>,
}

#[derive(Debug, Deserialize)]
struct BugComments {
    comments: Vec<Value>,
}
