//! Error types for the Bugzilla SDK.

use serde::Deserialize;

/// Result type for SDK operations.
pub type BugzillaResult<T> = Result<T, BugzillaError>;

/// Error types that can occur when talking to Bugzilla.
#[derive(Debug, thiserror::Error)]
pub enum BugzillaError {
    /// Bugzilla answered with a non-success status.
    #[error("Bugzilla returned status {status} after {attempts} attempt(s): {message}")]
    Api {
        status: u16,
        message: String,
        attempts: u32,
    },

    /// The exchange failed on the wire: connect failure, timeout, reset or a truncated body.
    #[error("Request to Bugzilla failed after {attempts} attempt(s): {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
        attempts: u32,
    },

    /// The response did not have the expected shape.
    #[error("Unexpected response from Bugzilla: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl BugzillaError {
    /// Number of attempts made before giving up, zero if no call was made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Api { attempts, .. } | Self::Transport { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    /// Upstream HTTP status, if Bugzilla answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the last attempt timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    /// Create an API error from a status code and response body.
    pub fn from_response(status: u16, body: &str, attempts: u32) -> Self {
        let message = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(error_response) => error_response.message,
            Err(_) => body.to_string(),
        };
        Self::Api {
            status,
            message,
            attempts,
        }
    }
}

/// Error body returned by the Bugzilla REST API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_uses_bugzilla_message() {
        let body = r#"{"error":true,"code":101,"message":"Bug #99 does not exist.","documentation":"https://bugzilla.readthedocs.org"}"#;
        let err = BugzillaError::from_response(404, body, 1);

        match &err {
            BugzillaError::Api {
                status,
                message,
                attempts,
            } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "Bug #99 does not exist.");
                assert_eq!(*attempts, 1);
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_from_response_falls_back_to_raw_body() {
        let err = BugzillaError::from_response(502, "Bad Gateway", 3);
        assert_eq!(
            err.to_string(),
            "Bugzilla returned status 502 after 3 attempt(s): Bad Gateway"
        );
        assert_eq!(err.attempts(), 3);
    }

    #[test]
    fn test_parse_has_no_attempts() {
        let err = BugzillaError::Parse("missing `bugs`".to_string());
        assert_eq!(err.attempts(), 0);
        assert_eq!(err.status(), None);
        assert!(!err.is_timeout());
    }
}
