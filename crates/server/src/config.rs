use anyhow::{Context, Result};
use bugzilla_mcp::{MethodGateSet, ServerConfig, DEFAULT_API_KEY_HEADER};
use bugzilla_sdk::AuthScheme;
use clap::{Parser, ValueEnum};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "mcp-bugzilla")]
#[command(about = "MCP server exposing a Bugzilla instance to agent clients", long_about = None)]
pub struct Args {
    /// Base URL of the Bugzilla instance
    #[arg(long, env = "BUGZILLA_SERVER")]
    pub bugzilla_server: String,

    /// Host to bind to
    #[arg(long, env = "MCP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "MCP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Inbound header carrying the caller's Bugzilla API key
    #[arg(long, env = "MCP_API_KEY_HEADER", default_value = DEFAULT_API_KEY_HEADER)]
    pub api_key_header: String,

    /// Comma-separated tools and prompts to disable, e.g. `BUG_INFO,ADD_COMMENT`
    #[arg(long, env = "MCP_BUGZILLA_DISABLED_METHODS", default_value = "")]
    pub disabled_methods: String,

    /// How the API key is presented to Bugzilla
    #[arg(long, env = "BUGZILLA_AUTH_SCHEME", value_enum, default_value_t = AuthSchemeArg::ApiKeyHeader)]
    pub auth_scheme: AuthSchemeArg,

    /// Timeout of one attempt against Bugzilla, in seconds
    #[arg(long, env = "BUGZILLA_TIMEOUT_SECS", default_value_t = 30)]
    pub tracker_timeout_secs: u64,

    /// Deadline of one tool or prompt invocation, in seconds
    #[arg(long, env = "MCP_REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Total attempts per Bugzilla call, first try included
    #[arg(long, env = "BUGZILLA_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthSchemeArg {
    /// `X-BUGZILLA-API-KEY` header
    ApiKeyHeader,
    /// `Authorization: Bearer` header
    Bearer,
    /// `api_key` query parameter
    Query,
}

impl From<AuthSchemeArg> for AuthScheme {
    fn from(arg: AuthSchemeArg) -> Self {
        match arg {
            AuthSchemeArg::ApiKeyHeader => AuthScheme::ApiKeyHeader,
            AuthSchemeArg::Bearer => AuthScheme::Bearer,
            AuthSchemeArg::Query => AuthScheme::QueryParam,
        }
    }
}

impl Args {
    /// Freeze the parsed arguments into the gateway configuration.
    pub fn into_server_config(self) -> Result<ServerConfig> {
        if self.max_attempts == 0 {
            anyhow::bail!("--max-attempts must be at least 1");
        }
        if self.tracker_timeout_secs == 0 || self.request_timeout_secs == 0 {
            anyhow::bail!("timeouts must be at least one second");
        }

        let mut config = ServerConfig::new(&self.bugzilla_server)
            .context("Invalid --bugzilla-server")?
            .with_api_key_header(&self.api_key_header)
            .context("Invalid --api-key-header")?;

        config.host = self.host;
        config.port = self.port;
        config.disabled_methods = MethodGateSet::parse(&self.disabled_methods);
        config.auth_scheme = self.auth_scheme.into();
        config.tracker_timeout = Duration::from_secs(self.tracker_timeout_secs);
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config.retry_policy.max_attempts = self.max_attempts;
        config.log_level = self.log_level;

        Ok(config)
    }
}
