//! Event payload types

mod event;

pub use event::{Event, NamedEvent};
