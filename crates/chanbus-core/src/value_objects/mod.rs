//! Value objects - immutable types that identify channels and receivers

mod channel_id;
mod context;

pub use channel_id::{ChannelId, ChannelName, DEFAULT_CHANNEL, GENERATED_CHANNEL_PREFIX};
pub use context::Context;
