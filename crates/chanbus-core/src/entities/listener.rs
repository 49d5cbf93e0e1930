//! Listener entries
//!
//! A listener is the stored registration of an event name, a callback and the
//! context the callback is bound to. Two listeners are the same registration
//! when all three match by identity, never by value.

use std::fmt;
use std::sync::Arc;

use crate::value_objects::Context;

/// Outcome of a single callback invocation
pub type ListenerResult = anyhow::Result<()>;

/// Listener callback: receives its bound context and the dispatched payload
pub type Callback<P> = Arc<dyn Fn(&Context, &P) -> ListenerResult + Send + Sync>;

/// Handle to a stored listener, usable for direct removal
pub type ListenerHandle<P> = Arc<Listener<P>>;

/// Wrap a closure as a shareable [`Callback`]
///
/// Keep the returned value around: removing a listener by signature needs the
/// same callback, not an equivalent closure.
pub fn callback<P, F>(f: F) -> Callback<P>
where
    F: Fn(&Context, &P) -> ListenerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A registered (event name, callback, context) triple
pub struct Listener<P> {
    event_name: String,
    callback: Callback<P>,
    context: Context,
}

impl<P> Listener<P> {
    /// Create a new listener entry
    pub fn new(event_name: impl Into<String>, callback: Callback<P>, context: Context) -> Self {
        Self {
            event_name: event_name.into(),
            callback,
            context,
        }
    }

    /// Event name this listener is registered under
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// The callback
    pub fn callback(&self) -> &Callback<P> {
        &self.callback
    }

    /// The bound context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Check the identity triple
    pub fn matches(&self, event_name: &str, callback: &Callback<P>, context: &Context) -> bool {
        self.event_name == event_name
            && Arc::ptr_eq(&self.callback, callback)
            && self.context.ptr_eq(context)
    }

    /// Invoke the callback bound to its context
    pub fn trigger(&self, payload: &P) -> ListenerResult {
        (self.callback)(&self.context, payload)
    }
}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("event_name", &self.event_name)
            .field("callback", &Arc::as_ptr(&self.callback).cast::<()>())
            .field("context", &self.context)
            .finish()
    }
}
