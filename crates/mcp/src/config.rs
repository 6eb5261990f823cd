//! Process-wide, read-only gateway configuration.

use crate::gate::MethodGateSet;
use bugzilla_sdk::{AuthScheme, RetryPolicy};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_KEY_HEADER: &str = "ApiKey";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid Bugzilla server URL `{url}`: {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("API key header name must not be empty")]
    EmptyHeaderName,
}

/// Effective configuration of one gateway process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    bugzilla_server: String,
    pub host: String,
    pub port: u16,
    pub api_key_header: String,
    pub disabled_methods: MethodGateSet,
    pub auth_scheme: AuthScheme,
    /// Timeout of one attempt against Bugzilla.
    pub tracker_timeout: Duration,
    /// Deadline of one inbound tool or prompt invocation.
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub log_level: String,
}

impl ServerConfig {
    /// Configuration with defaults for everything but the Bugzilla URL.
    pub fn new(bugzilla_server: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            bugzilla_server: normalize_server_url(bugzilla_server)?,
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            disabled_methods: MethodGateSet::default(),
            auth_scheme: AuthScheme::default(),
            tracker_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            retry_policy: RetryPolicy::default(),
            log_level: "info".to_string(),
        })
    }

    pub fn with_api_key_header(mut self, header: &str) -> Result<Self, ConfigError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(ConfigError::EmptyHeaderName);
        }
        self.api_key_header = header.to_string();
        Ok(self)
    }

    /// Bugzilla base URL without a trailing slash.
    pub fn bugzilla_server(&self) -> &str {
        &self.bugzilla_server
    }

    /// Address to listen on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Effective settings as reported to clients. Contains no secrets.
    pub fn describe(&self) -> Value {
        json!({
            "bugzilla_server": self.bugzilla_server,
            "host": self.host,
            "port": self.port,
            "api_key_header": self.api_key_header,
            "disabled_methods": self.disabled_methods.iter().collect::<Vec<_>>(),
            "auth_scheme": self.auth_scheme.as_str(),
            "tracker_timeout_secs": self.tracker_timeout.as_secs(),
            "request_timeout_secs": self.request_timeout.as_secs(),
            "max_attempts": self.retry_policy.max_attempts,
            "log_level": self.log_level,
        })
    }
}

fn normalize_server_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidServerUrl {
        url: trimmed.to_string(),
        reason,
    };

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query strings and fragments are not allowed".to_string()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
