//! Per-channel listener storage and dispatch

mod listener_registry;
mod options;

pub use listener_registry::ListenerRegistry;
pub use options::{ErrorPolicy, RegistryOptions};
