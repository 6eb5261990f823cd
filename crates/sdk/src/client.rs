//! Main client for the Bugzilla SDK.

use crate::api::{BugsApi, DocsApi};
use crate::config::{AuthScheme, ClientConfig, RetryPolicy};
use crate::error::{BugzillaError, BugzillaResult};
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Client for the Bugzilla REST API.
#[derive(Debug, Clone)]
pub struct BugzillaClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl BugzillaClient {
    /// Create a new client builder.
    pub fn builder() -> BugzillaClientBuilder {
        BugzillaClientBuilder::new()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the bugs API.
    pub fn bugs(&self) -> BugsApi<'_> {
        BugsApi::new(self)
    }

    /// Get the documentation pages API.
    pub fn docs(&self) -> DocsApi<'_> {
        DocsApi::new(self)
    }
}

/// Builder for creating a [`BugzillaClient`].
pub struct BugzillaClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    auth_scheme: AuthScheme,
    timeout: Duration,
    retry_policy: RetryPolicy,
    http_client: Option<reqwest::Client>,
}

impl BugzillaClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            auth_scheme: AuthScheme::default(),
            timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
            http_client: None,
        }
    }

    /// Set the base URL of the Bugzilla server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Choose how the API key is sent.
    pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    /// Set the timeout of a single attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Reuse an existing connection pool.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the client.
    pub fn build(self) -> BugzillaResult<BugzillaClient> {
        let base_url_str = self
            .base_url
            .ok_or_else(|| BugzillaError::Config("base_url is required".to_string()))?;

        let base_url = Url::parse(&base_url_str)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(BugzillaError::Config(format!(
                "unsupported URL scheme: {}",
                base_url.scheme()
            )));
        }

        let config = Arc::new(ClientConfig {
            base_url,
            api_key: self.api_key,
            auth_scheme: self.auth_scheme,
            timeout: self.timeout,
            retry_policy: self.retry_policy,
        });

        let http = match self.http_client {
            Some(client) => HttpTransport::with_client(client, config.clone())?,
            None => HttpTransport::new(config.clone())?,
        };

        Ok(BugzillaClient { config, http })
    }
}

impl Default for BugzillaClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
