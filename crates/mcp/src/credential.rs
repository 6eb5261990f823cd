//! Inbound request headers and the per-request Bugzilla credential.

use crate::error::{GatewayError, GatewayResult};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Headers of one inbound request. Names are stored lower-cased.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    headers: BTreeMap<String, String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from name/value pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = pairs
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();
        Self { headers }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// All headers, with the value of `secret` masked.
    pub fn redacted(&self, secret: &str) -> BTreeMap<String, String> {
        let secret = secret.to_ascii_lowercase();
        self.headers
            .iter()
            .map(|(name, value)| {
                let value = if *name == secret {
                    "<redacted>".to_string()
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect()
    }
}

/// Bugzilla API key presented by one inbound request.
///
/// Not `Display`, and `Debug` prints only a fingerprint, so the key cannot
/// end up in a log line by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Short, stable identifier safe for logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..4])
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.fingerprint())
    }
}

/// Read the credential from the configured header.
///
/// Fails with a validation error when the header is absent or blank.
pub fn extract_credential(headers: &RequestHeaders, header_name: &str) -> GatewayResult<Credential> {
    match headers.get(header_name).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(Credential::new(value)),
        _ => Err(GatewayError::Validation(format!(
            "`{header_name}` header is required"
        ))),
    }
}
