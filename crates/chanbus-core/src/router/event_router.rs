//! Event router
//!
//! Owns every channel's listener registry using `DashMap` for thread-safe
//! access and routes listen/unlisten/dispatch calls to the right one.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::entities::{Callback, ListenerHandle};
use crate::error::{BusError, BusResult};
use crate::events::NamedEvent;
use crate::registry::{ListenerRegistry, RegistryOptions};
use crate::value_objects::{ChannelId, Context};

/// Routes events to per-channel listener registries
///
/// Registries are handed out as `Arc`s and the map guard is released before
/// any forwarded call, so listener callbacks may re-enter the router, even to
/// destroy the channel that is currently dispatching.
pub struct EventRouter<P> {
    /// Registries by channel id
    channels: DashMap<ChannelId, Arc<ListenerRegistry<P>>>,

    /// Options every new registry is created with
    options: RegistryOptions,
}

impl<P> EventRouter<P> {
    /// Create a router holding only the default channel
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// Create a router whose registries use `options`
    #[must_use]
    pub fn with_options(options: RegistryOptions) -> Self {
        let channels = DashMap::new();
        channels.insert(
            ChannelId::Default,
            Arc::new(ListenerRegistry::with_options(ChannelId::Default, options)),
        );

        tracing::debug!(options = ?options, "Event router initialized");

        Self { channels, options }
    }

    /// Create a new router wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Options new registries are created with
    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    /// Get the registry for `id`, creating it if absent.
    ///
    /// `None` creates a channel under a freshly generated id.
    pub fn channel(&self, id: Option<ChannelId>) -> Arc<ListenerRegistry<P>> {
        let id = id.unwrap_or_else(ChannelId::generate);

        Arc::clone(
            self.channels
                .entry(id.clone())
                .or_insert_with(|| {
                    tracing::debug!(channel = %id, "Channel created");
                    Arc::new(ListenerRegistry::with_options(id.clone(), self.options))
                })
                .value(),
        )
    }

    /// Create a channel that must not exist yet
    pub fn create_channel(&self, id: ChannelId) -> BusResult<Arc<ListenerRegistry<P>>> {
        match self.channels.entry(id.clone()) {
            Entry::Occupied(_) => Err(BusError::ChannelAlreadyExists(id)),
            Entry::Vacant(slot) => {
                let registry = Arc::new(ListenerRegistry::with_options(id.clone(), self.options));
                slot.insert(Arc::clone(&registry));

                tracing::debug!(channel = %id, "Channel created");

                Ok(registry)
            }
        }
    }

    /// Get an existing channel
    pub fn get_channel(&self, id: &ChannelId) -> Option<Arc<ListenerRegistry<P>>> {
        self.channels.get(id).map(|r| Arc::clone(r.value()))
    }

    pub fn has_channel(&self, id: &ChannelId) -> bool {
        self.channels.contains_key(id)
    }

    /// Remove a channel and every listener it holds
    ///
    /// A registry previously returned by [`channel`](Self::channel) or
    /// [`get_channel`](Self::get_channel) stays usable on its own, but it is
    /// no longer reachable through the router: listeners added to it after
    /// this call are never dispatched by router calls. Drop such handles
    /// once their channel is destroyed.
    pub fn destroy_channel(&self, id: &ChannelId) -> bool {
        if let Some((_, registry)) = self.channels.remove(id) {
            tracing::debug!(
                channel = %id,
                listeners = registry.total_listener_count(),
                "Channel destroyed"
            );
            true
        } else {
            false
        }
    }

    /// Register a listener on an existing channel
    pub fn listen(
        &self,
        channel: &ChannelId,
        event_name: impl Into<String>,
        callback: Callback<P>,
        context: Context,
    ) -> BusResult<ListenerHandle<P>> {
        let registry = self.require(channel)?;
        Ok(registry.listen(event_name, callback, context))
    }

    /// Remove a listener by signature; false if the channel does not exist
    pub fn unlisten(
        &self,
        channel: &ChannelId,
        event_name: &str,
        callback: &Callback<P>,
        context: &Context,
    ) -> bool {
        self.get_channel(channel)
            .is_some_and(|registry| registry.unlisten(event_name, callback, context))
    }

    /// Remove a listener by handle; false if the channel does not exist
    pub fn unlisten_by_handle(&self, channel: &ChannelId, handle: &ListenerHandle<P>) -> bool {
        self.get_channel(channel)
            .is_some_and(|registry| registry.unlisten_by_handle(handle))
    }

    /// Dispatch `event_name` with `payload` on an existing channel
    pub fn dispatch(&self, channel: &ChannelId, event_name: &str, payload: &P) -> BusResult<usize> {
        let registry = self.require(channel)?;
        registry.dispatch(event_name, payload)
    }

    /// Dispatch a payload under the name it reports
    pub fn dispatch_event(&self, channel: &ChannelId, event: &P) -> BusResult<usize>
    where
        P: NamedEvent,
    {
        let registry = self.require(channel)?;
        registry.dispatch_event(event)
    }

    pub fn mute_channel(&self, channel: &ChannelId) -> BusResult<()> {
        self.require(channel)?.mute();
        Ok(())
    }

    pub fn unmute_channel(&self, channel: &ChannelId) -> BusResult<()> {
        self.require(channel)?.unmute();
        Ok(())
    }

    /// Ids of all live channels
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|r| r.key().clone()).collect()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn require(&self, channel: &ChannelId) -> BusResult<Arc<ListenerRegistry<P>>> {
        self.get_channel(channel).ok_or_else(|| {
            tracing::warn!(channel = %channel, "Channel not found");
            BusError::ChannelNotFound(channel.clone())
        })
    }
}

impl<P> Default for EventRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventRouter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("channels", &self.channels.len())
            .field("options", &self.options)
            .finish()
    }
}
