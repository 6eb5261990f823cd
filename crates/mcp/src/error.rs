//! Failure taxonomy of the gateway and its mapping onto JSON-RPC.

use crate::protocol::JsonRpcError;
use bugzilla_sdk::BugzillaError;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Everything a tool or prompt invocation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or malformed caller input, including an absent credential.
    #[error("{0}")]
    Validation(String),

    /// Bugzilla failed or could not be reached.
    #[error("{message}")]
    Tool {
        message: String,
        status: Option<u16>,
        attempts: u32,
    },

    /// Bugzilla answered with something we could not interpret.
    #[error("{0}")]
    Parse(String),

    /// The tool or prompt was switched off by the operator.
    #[error("`{0}` is disabled on this server")]
    MethodDisabled(String),

    /// Broken contract inside the gateway. Never shown to callers verbatim.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Prefix tracker failures with what the handler was trying to do.
    pub fn context(self, what: &str) -> Self {
        match self {
            Self::Tool {
                message,
                status,
                attempts,
            } => Self::Tool {
                message: format!("{what}\nReason: {message}"),
                status,
                attempts,
            },
            Self::Parse(message) => Self::Parse(format!("{what}\nReason: {message}")),
            other => other,
        }
    }

    /// Deadline of the inbound request expired.
    pub fn deadline_exceeded() -> Self {
        Self::Tool {
            message: "request deadline exceeded".to_string(),
            status: None,
            attempts: 0,
        }
    }

    /// Failures that belong in a tool result rather than a protocol error.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Tool { .. } | Self::Parse(_))
    }

    /// Protocol error for this failure. Internal details are not included.
    pub fn to_jsonrpc(&self) -> JsonRpcError {
        match self {
            Self::Validation(message) => JsonRpcError::invalid_params(message.clone()),
            Self::MethodDisabled(_) => {
                JsonRpcError::custom(JsonRpcError::METHOD_DISABLED, self.to_string())
            }
            Self::Tool { .. } | Self::Parse(_) => {
                JsonRpcError::custom(JsonRpcError::PROMPT_FAILED, self.to_string())
            }
            Self::Internal(_) => JsonRpcError::internal_error("Internal error"),
        }
    }
}

impl From<BugzillaError> for GatewayError {
    fn from(err: BugzillaError) -> Self {
        match err {
            BugzillaError::Parse(message) => Self::Parse(message),
            err @ (BugzillaError::Config(_) | BugzillaError::InvalidUrl(_)) => {
                Self::Internal(err.to_string())
            }
            other => Self::Tool {
                message: other.to_string(),
                status: other.status(),
                attempts: other.attempts(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_becomes_tool_error() {
        let err: GatewayError = BugzillaError::from_response(404, "gone", 1).into();
        match err {
            GatewayError::Tool {
                status, attempts, ..
            } => {
                assert_eq!(status, Some(404));
                assert_eq!(attempts, 1);
            }
            other => panic!("Expected Tool error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_stays_parse_error() {
        let err: GatewayError = BugzillaError::Parse("missing `bugs`".to_string()).into();
        assert!(matches!(err, GatewayError::Parse(_)));
        assert!(err.is_execution_failure());
    }

    #[test]
    fn test_config_error_is_internal_and_hidden() {
        let err: GatewayError = BugzillaError::Config("secret detail".to_string()).into();
        assert!(matches!(err, GatewayError::Internal(_)));

        let rpc = err.to_jsonrpc();
        assert_eq!(rpc.code, JsonRpcError::INTERNAL_ERROR);
        assert!(!rpc.message.contains("secret detail"));
    }

    #[test]
    fn test_context_prefixes_tool_errors_only() {
        let err = GatewayError::Tool {
            message: "boom".to_string(),
            status: Some(500),
            attempts: 3,
        }
        .context("Failed to fetch bug info");
        assert_eq!(err.to_string(), "Failed to fetch bug info\nReason: boom");

        let validation = GatewayError::Validation("bad".to_string()).context("ignored");
        assert_eq!(validation.to_string(), "bad");
    }

    #[test]
    fn test_jsonrpc_codes() {
        assert_eq!(
            GatewayError::Validation("x".into()).to_jsonrpc().code,
            JsonRpcError::INVALID_PARAMS
        );
        assert_eq!(
            GatewayError::MethodDisabled("BUG_INFO".into()).to_jsonrpc().code,
            JsonRpcError::METHOD_DISABLED
        );
        assert_eq!(
            GatewayError::deadline_exceeded().to_jsonrpc().code,
            JsonRpcError::PROMPT_FAILED
        );
    }
}
