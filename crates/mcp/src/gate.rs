//! Operator switch for individual tools and prompts.

use crate::error::{GatewayError, GatewayResult};
use std::collections::BTreeSet;

/// Set of disabled tool/prompt identifiers, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodGateSet {
    disabled: BTreeSet<String>,
}

impl MethodGateSet {
    /// Parse a comma-separated list such as `BUG_INFO, add_comment`.
    pub fn parse(raw: &str) -> Self {
        Self::from_names(raw.split(','))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let disabled = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_ascii_uppercase())
            .filter(|name| !name.is_empty())
            .collect();
        Self { disabled }
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(&name.to_ascii_uppercase())
    }

    /// Refuse disabled identifiers before anything else runs.
    pub fn check(&self, name: &str) -> GatewayResult<()> {
        if self.is_disabled(name) {
            tracing::info!(method = name, "Rejected call to disabled method");
            return Err(GatewayError::MethodDisabled(name.to_string()));
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.disabled.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.disabled.is_empty()
    }
}
