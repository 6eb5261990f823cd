//! Documentation pages served by Bugzilla outside the REST API.

use crate::client::BugzillaClient;
use crate::error::BugzillaResult;

/// Access to Bugzilla's help pages.
pub struct DocsApi<'a> {
    client: &'a BugzillaClient,
}

impl<'a> DocsApi<'a> {
    pub(crate) fn new(client: &'a BugzillaClient) -> Self {
        Self { client }
    }

    /// HTML reference for the quicksearch syntax.
    pub async fn quicksearch_syntax(&self) -> BugzillaResult<String> {
        self.client
            .http
            .get_page("page.cgi", &[("id", "quicksearch.html")])
            .await
    }
}
