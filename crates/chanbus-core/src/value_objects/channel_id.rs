//! Channel identifiers
//!
//! Naming scheme for the channels an `EventRouter` owns. The default channel
//! is a dedicated variant, so an ordinary channel name can never shadow it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Reserved textual form of the default channel
pub const DEFAULT_CHANNEL: &str = "default_channel";
/// Prefix used when rendering generated channel ids
pub const GENERATED_CHANNEL_PREFIX: &str = "generated:";

/// Identifier of a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ChannelId {
    /// The always-present channel used when no channel is specified
    #[default]
    Default,
    /// A channel named by the caller
    Named(ChannelName),
    /// A channel created without a name
    Generated(Uuid),
}

impl ChannelId {
    /// Create a channel id from its textual name
    ///
    /// The reserved name resolves to [`ChannelId::Default`], and
    /// `generated:<uuid>` resolves to the generated id it renders, so every
    /// id reads back from its own `Display` output unchanged.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == DEFAULT_CHANNEL {
            return Self::Default;
        }

        let generated = name
            .strip_prefix(GENERATED_CHANNEL_PREFIX)
            .and_then(|id_str| Uuid::parse_str(id_str).ok());
        match generated {
            Some(id) => Self::Generated(id),
            None => Self::Named(ChannelName(name)),
        }
    }

    /// Generate a fresh, process-unique channel id
    #[must_use]
    pub fn generate() -> Self {
        Self::Generated(Uuid::new_v4())
    }

    /// Check if this is the default channel
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Get the textual channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Default => DEFAULT_CHANNEL.to_string(),
            Self::Named(name) => name.as_str().to_string(),
            Self::Generated(id) => format!("{GENERATED_CHANNEL_PREFIX}{id}"),
        }
    }

    /// Parse a channel name back to a `ChannelId`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        Self::named(name)
    }
}

/// Name of a caller-named channel
///
/// Only [`ChannelId::named`] builds one, so a `Named` id never carries the
/// reserved name or a generated id's text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str(DEFAULT_CHANNEL),
            Self::Named(name) => f.write_str(name.as_str()),
            Self::Generated(id) => write!(f, "{GENERATED_CHANNEL_PREFIX}{id}"),
        }
    }
}

impl From<&str> for ChannelId {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for ChannelId {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl std::str::FromStr for ChannelId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

// Serialized as its textual name
impl Serialize for ChannelId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}
