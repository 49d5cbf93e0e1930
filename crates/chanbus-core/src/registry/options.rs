//! Registry behaviour switches

use serde::{Deserialize, Serialize};

/// What a dispatch pass does when a listener callback returns an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the pass and return the error to the dispatcher
    #[default]
    Propagate,
    /// Log the error and keep delivering to the remaining listeners
    Isolate,
}

/// Options shared by every registry a router creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryOptions {
    /// Store identical (event, callback, context) triples more than once
    pub allow_duplicates: bool,
    /// Listener failure handling
    pub error_policy: ErrorPolicy,
}

impl RegistryOptions {
    /// Set duplicate handling
    #[must_use]
    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    /// Set listener failure handling
    #[must_use]
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}
