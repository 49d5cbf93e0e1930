//! Listener registry
//!
//! Per-channel storage mapping event names to ordered listener sequences.
//!
//! All methods take `&self`. The listener map and the mute flag sit behind a
//! single `parking_lot::Mutex` that is never held while a callback runs, so
//! callbacks may call back into the registry (listen, unlisten, dispatch)
//! without deadlocking.
//!
//! Dispatch iterates over a snapshot taken when the pass starts:
//!   - A listener removed *during* the pass is still called in that pass.
//!   - A listener added *during* the pass is first called on the next dispatch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::options::{ErrorPolicy, RegistryOptions};
use crate::entities::{Callback, Listener, ListenerHandle};
use crate::error::{BusError, BusResult};
use crate::events::NamedEvent;
use crate::value_objects::{ChannelId, Context};

struct RegistryState<P> {
    /// Event name -> listeners in registration order; never holds empty vectors
    listeners: HashMap<String, Vec<ListenerHandle<P>>>,
    muted: bool,
}

impl<P> RegistryState<P> {
    /// Take out the first listener of `event_name` accepted by `pred`
    ///
    /// The caller drops the returned handle after releasing the lock.
    fn remove_first(
        &mut self,
        event_name: &str,
        pred: impl Fn(&ListenerHandle<P>) -> bool,
    ) -> Option<ListenerHandle<P>> {
        let listeners = self.listeners.get_mut(event_name)?;
        let index = listeners.iter().position(pred)?;

        let removed = listeners.remove(index);
        if listeners.is_empty() {
            self.listeners.remove(event_name);
        }
        Some(removed)
    }
}

/// Listener storage and dispatch for one channel
pub struct ListenerRegistry<P> {
    id: ChannelId,
    options: RegistryOptions,
    state: Mutex<RegistryState<P>>,
}

impl<P> ListenerRegistry<P> {
    /// Create a standalone registry with a generated id
    pub fn new() -> Self {
        Self::with_id(ChannelId::generate())
    }

    /// Create a registry for the given channel
    pub fn with_id(id: ChannelId) -> Self {
        Self::with_options(id, RegistryOptions::default())
    }

    /// Create a registry for the given channel with custom options
    pub fn with_options(id: ChannelId, options: RegistryOptions) -> Self {
        Self {
            id,
            options,
            state: Mutex::new(RegistryState {
                listeners: HashMap::new(),
                muted: false,
            }),
        }
    }

    /// Channel this registry serves
    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Options this registry was created with
    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Register `callback` bound to `context` for `event_name`.
    ///
    /// Unless duplicates are allowed, registering a triple that is already
    /// stored returns the existing entry instead of adding a second one.
    pub fn listen(
        &self,
        event_name: impl Into<String>,
        callback: Callback<P>,
        context: Context,
    ) -> ListenerHandle<P> {
        let event_name = event_name.into();
        let mut state = self.state.lock();
        let listeners = state.listeners.entry(event_name.clone()).or_default();

        if !self.options.allow_duplicates {
            if let Some(existing) = listeners
                .iter()
                .find(|listener| listener.matches(&event_name, &callback, &context))
            {
                tracing::trace!(
                    channel = %self.id,
                    event = %event_name,
                    "Listener already registered"
                );
                return Arc::clone(existing);
            }
        }

        tracing::trace!(
            channel = %self.id,
            event = %event_name,
            bound = context.is_bound(),
            "Listener added"
        );

        let listener = Arc::new(Listener::new(event_name, callback, context));
        listeners.push(Arc::clone(&listener));
        listener
    }

    /// Remove the listener identified by (`event_name`, `callback`, `context`).
    ///
    /// Returns whether a listener was found and removed.
    pub fn unlisten(&self, event_name: &str, callback: &Callback<P>, context: &Context) -> bool {
        let removed = self
            .state
            .lock()
            .remove_first(event_name, |listener| {
                listener.matches(event_name, callback, context)
            });

        if removed.is_some() {
            tracing::trace!(channel = %self.id, event = %event_name, "Listener removed");
        }
        removed.is_some()
    }

    /// Remove a listener through the handle returned by [`listen`](Self::listen).
    pub fn unlisten_by_handle(&self, handle: &ListenerHandle<P>) -> bool {
        let event_name = handle.event_name();
        let removed = self
            .state
            .lock()
            .remove_first(event_name, |listener| Arc::ptr_eq(listener, handle));

        if removed.is_some() {
            tracing::trace!(channel = %self.id, event = %event_name, "Listener removed by handle");
        }
        removed.is_some()
    }

    /// Invoke every listener of `event_name`, in registration order.
    ///
    /// Returns the number of listeners invoked: zero when the registry is
    /// muted or nobody listens to `event_name`.
    ///
    /// With [`ErrorPolicy::Propagate`] the first failing callback ends the
    /// pass and its error is returned. With [`ErrorPolicy::Isolate`] failures
    /// are logged and delivery continues. Panics are not caught.
    pub fn dispatch(&self, event_name: &str, payload: &P) -> BusResult<usize> {
        let snapshot = {
            let state = self.state.lock();
            if state.muted {
                tracing::trace!(channel = %self.id, event = %event_name, "Channel muted, dispatch skipped");
                return Ok(0);
            }
            match state.listeners.get(event_name) {
                Some(listeners) => listeners.clone(),
                None => return Ok(0),
            }
        };

        let mut invoked = 0;
        for listener in &snapshot {
            invoked += 1;
            if let Err(source) = listener.trigger(payload) {
                match self.options.error_policy {
                    ErrorPolicy::Propagate => {
                        return Err(BusError::Listener {
                            channel: self.id.clone(),
                            event: event_name.to_string(),
                            source,
                        });
                    }
                    ErrorPolicy::Isolate => {
                        tracing::error!(
                            channel = %self.id,
                            event = %event_name,
                            error = %source,
                            "Listener failed"
                        );
                    }
                }
            }
        }

        tracing::trace!(
            channel = %self.id,
            event = %event_name,
            listeners = invoked,
            "Dispatched event"
        );

        Ok(invoked)
    }

    /// Dispatch a payload under the name it reports
    pub fn dispatch_event(&self, event: &P) -> BusResult<usize>
    where
        P: NamedEvent,
    {
        self.dispatch(event.event_name(), event)
    }

    /// Stop delivering events; registrations are kept
    pub fn mute(&self) {
        self.state.lock().muted = true;
        tracing::debug!(channel = %self.id, "Channel muted");
    }

    /// Resume delivering events
    pub fn unmute(&self) {
        self.state.lock().muted = false;
        tracing::debug!(channel = %self.id, "Channel unmuted");
    }

    pub fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    /// Snapshot of the listeners of `event_name`; empty if there are none.
    pub fn get_listeners(&self, event_name: &str) -> Vec<ListenerHandle<P>> {
        self.state
            .lock()
            .listeners
            .get(event_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_listeners(&self, event_name: &str) -> bool {
        self.state.lock().listeners.contains_key(event_name)
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.state.lock().listeners.get(event_name).map_or(0, Vec::len)
    }

    /// Number of listeners across all event names
    pub fn total_listener_count(&self) -> usize {
        self.state.lock().listeners.values().map(Vec::len).sum()
    }

    /// Event names that currently have listeners
    pub fn event_names(&self) -> Vec<String> {
        self.state.lock().listeners.keys().cloned().collect()
    }

    /// Drop every listener; returns how many were removed
    ///
    /// The listeners are dropped after the lock is released, so a callback or
    /// context whose `Drop` calls into this registry does not deadlock.
    pub fn clear(&self) -> usize {
        let listeners = std::mem::take(&mut self.state.lock().listeners);
        let removed: usize = listeners.values().map(Vec::len).sum();
        drop(listeners);

        tracing::debug!(channel = %self.id, removed = removed, "Channel cleared");
        removed
    }
}

impl<P> Default for ListenerRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for ListenerRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ListenerRegistry")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("events", &state.listeners.len())
            .field("muted", &state.muted)
            .finish()
    }
}
