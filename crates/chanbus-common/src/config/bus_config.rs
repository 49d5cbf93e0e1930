//! Bus configuration
//!
//! Deserializable settings for building an `EventRouter`, meant to be embedded
//! in a host application's own configuration.

use chanbus_core::{ChannelId, ErrorPolicy, EventRouter, RegistryOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Event bus configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BusConfig {
    /// Store identical (event, callback, context) registrations more than once
    #[serde(default)]
    pub allow_duplicate_listeners: bool,

    /// What dispatch does when a listener fails
    #[serde(default)]
    pub listener_errors: ErrorPolicy,

    /// Channels created up front, next to the default channel
    #[serde(default)]
    pub channels: Vec<ChannelId>,
}

impl BusConfig {
    /// Parse and validate a JSON configuration document
    ///
    /// # Errors
    /// Returns an error if the document is malformed or names a channel twice
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the pre-declared channel list
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if channel.is_default() {
                return Err(ConfigError::InvalidValue(
                    "channels",
                    format!("{channel} is reserved"),
                ));
            }
            if !seen.insert(channel) {
                return Err(ConfigError::InvalidValue(
                    "channels",
                    format!("{channel} is listed twice"),
                ));
            }
        }
        Ok(())
    }

    /// Options every registry of the router is created with
    #[must_use]
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions::default()
            .allow_duplicates(self.allow_duplicate_listeners)
            .error_policy(self.listener_errors)
    }

    /// Build a router with the configured options and channels
    #[must_use]
    pub fn build_router<P>(&self) -> EventRouter<P> {
        let router = EventRouter::with_options(self.registry_options());
        for channel in &self.channels {
            router.channel(Some(channel.clone()));
        }

        tracing::debug!(
            channels = router.channel_count(),
            listener_errors = ?self.listener_errors,
            "Event router built from config"
        );

        router
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
