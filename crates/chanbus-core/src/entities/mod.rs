//! Domain entities - stored listener registrations

mod listener;

pub use listener::{callback, Callback, Listener, ListenerHandle, ListenerResult};
