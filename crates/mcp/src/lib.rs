// MCP (Model Context Protocol) gateway for Bugzilla
// Exposes Bugzilla operations as tools and prompts to agent clients,
// authenticating each call with the caller's own API key.

pub mod config;
pub mod credential;
pub mod error;
pub mod gate;
pub mod prompts;
pub mod protocol;
pub mod scope;
pub mod server;
pub mod tools;

pub use config::{ConfigError, ServerConfig, DEFAULT_API_KEY_HEADER};
pub use credential::{extract_credential, Credential, RequestHeaders};
pub use error::{GatewayError, GatewayResult};
pub use gate::MethodGateSet;
pub use scope::{ClientScope, ScopeStats};
pub use server::McpServer;
