//! Bus errors - error types for channel routing and dispatch

use thiserror::Error;

use crate::value_objects::ChannelId;

/// Errors raised by listener registries and the event router
#[derive(Debug, Error)]
pub enum BusError {
    // =========================================================================
    // Channel Errors
    // =========================================================================
    #[error("Channel not found: {0}")]
    ChannelNotFound(ChannelId),

    #[error("Channel already exists: {0}")]
    ChannelAlreadyExists(ChannelId),

    // =========================================================================
    // Dispatch Errors
    // =========================================================================
    #[error("Listener for '{event}' on channel {channel} failed: {source}")]
    Listener {
        channel: ChannelId,
        event: String,
        #[source]
        source: anyhow::Error,
    },
}

impl BusError {
    /// Get a stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::ChannelAlreadyExists(_) => "CHANNEL_EXISTS",
            Self::Listener { .. } => "LISTENER_FAILED",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ChannelNotFound(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ChannelAlreadyExists(_))
    }

    /// Check if a listener callback failed
    pub fn is_listener_failure(&self) -> bool {
        matches!(self, Self::Listener { .. })
    }

    /// The channel the error refers to
    pub fn channel(&self) -> &ChannelId {
        match self {
            Self::ChannelNotFound(channel)
            | Self::ChannelAlreadyExists(channel)
            | Self::Listener { channel, .. } => channel,
        }
    }
}

/// Result type alias for bus operations
pub type BusResult<T> = Result<T, BusError>;
