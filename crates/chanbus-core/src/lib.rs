//! # chanbus-core
//!
//! In-process publish/subscribe: listener registries keyed by event name,
//! grouped into channels owned by an event router. Dispatch is synchronous
//! and runs every matching callback on the caller's thread.
//! This crate performs no I/O and installs no tracing subscriber.

pub mod entities;
pub mod error;
pub mod events;
pub mod registry;
pub mod router;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{callback, Callback, Listener, ListenerHandle, ListenerResult};
pub use error::{BusError, BusResult};
pub use events::{Event, NamedEvent};
pub use registry::{ErrorPolicy, ListenerRegistry, RegistryOptions};
pub use router::EventRouter;
pub use value_objects::{ChannelId, ChannelName, Context, DEFAULT_CHANNEL, GENERATED_CHANNEL_PREFIX};
