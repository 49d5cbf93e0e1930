//! Event bus integration tests
//!
//! Exercises routers, channels and registries together through the public
//! API only.
//!
//! Run with: cargo test -p integration-tests --test bus_tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use chanbus_common::BusConfig;
use chanbus_core::{
    callback, BusError, ChannelId, Context, ErrorPolicy, Event, EventRouter, ListenerHandle,
    ListenerRegistry, RegistryOptions,
};
use integration_tests::{
    init_test_tracing, unique_channel, CallRecorder, DocumentEvent, Message, CHANNEL0, EVENT1,
    EVENT2,
};

// ============================================================================
// Default Channel Scenarios
// ============================================================================

#[test]
fn test_dispatch_reaches_single_listener_once() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<()>::new();
    let this = Context::new(());

    router
        .listen(&ChannelId::Default, EVENT1, recorder.listener("callback1"), this)
        .unwrap();
    router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap();

    assert_eq!(recorder.count("callback1"), 1);
}

#[test]
fn test_dispatch_reaches_only_matching_listeners() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<()>::new();
    let this = Context::new(());

    router
        .listen(&ChannelId::Default, EVENT1, recorder.listener("callback1"), this.clone())
        .unwrap();
    router
        .listen(&ChannelId::Default, EVENT2, recorder.listener("callback2"), this.clone())
        .unwrap();
    router
        .listen(&ChannelId::Default, EVENT1, recorder.listener("callback3"), this)
        .unwrap();

    let invoked = router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap();

    assert_eq!(invoked, 2);
    assert_eq!(recorder.tags(), vec!["callback1", "callback3"]);
    assert_eq!(recorder.count("callback2"), 0);
}

#[test]
fn test_unlisten_then_dispatch_skips_listener() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<()>::new();
    let callback1 = recorder.listener("callback1");
    let this = Context::new(());

    router
        .listen(&ChannelId::Default, EVENT1, Arc::clone(&callback1), this.clone())
        .unwrap();
    assert!(router.unlisten(&ChannelId::Default, EVENT1, &callback1, &this));
    router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap();

    assert_eq!(recorder.total(), 0);

    // Re-registering restores delivery
    router
        .listen(&ChannelId::Default, EVENT1, Arc::clone(&callback1), this)
        .unwrap();
    router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap();
    assert_eq!(recorder.count("callback1"), 1);
}

#[test]
fn test_repeated_registration_is_stored_once() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<()>::new();
    let callback1 = recorder.listener("callback1");
    let this = Context::new(());

    for _ in 0..3 {
        router
            .listen(&ChannelId::Default, EVENT1, Arc::clone(&callback1), this.clone())
            .unwrap();
    }

    let registry = router.get_channel(&ChannelId::Default).unwrap();
    assert_eq!(registry.get_listeners(EVENT1).len(), 1);
}

#[test]
fn test_payload_is_passed_through() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<Message>::new();
    router
        .listen(&ChannelId::Default, "message", recorder.listener("inbox"), Context::none())
        .unwrap();

    let first = Message::unique("hello");
    let second = Message::unique("again");
    router.dispatch(&ChannelId::Default, "message", &first).unwrap();
    router.dispatch(&ChannelId::Default, "message", &second).unwrap();

    assert_eq!(recorder.payloads("inbox"), vec![first, second]);
}

#[test]
fn test_dispatch_without_listeners_has_no_effect() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<()>::new();
    router
        .listen(&ChannelId::Default, EVENT1, recorder.listener("callback1"), Context::none())
        .unwrap();

    assert_eq!(router.dispatch(&ChannelId::Default, "unheard", &()).unwrap(), 0);
    assert_eq!(recorder.total(), 0);
    assert!(!router
        .get_channel(&ChannelId::Default)
        .unwrap()
        .has_listeners("unheard"));
}

// ============================================================================
// Channel Scenarios
// ============================================================================

#[test]
fn test_muted_channel_holds_listeners_until_unmuted() {
    init_test_tracing();
    let router = EventRouter::new();
    let channel0 = router.channel(Some(ChannelId::named(CHANNEL0)));
    let recorder = CallRecorder::<()>::new();

    router
        .listen(channel0.id(), EVENT1, recorder.listener("callback0"), Context::none())
        .unwrap();
    router.dispatch(channel0.id(), EVENT1, &()).unwrap();
    assert_eq!(recorder.count("callback0"), 1);

    channel0.mute();
    router.dispatch(channel0.id(), EVENT1, &()).unwrap();
    assert_eq!(recorder.count("callback0"), 1);

    channel0.unmute();
    router.dispatch(channel0.id(), EVENT1, &()).unwrap();
    assert_eq!(recorder.count("callback0"), 2);
}

#[test]
fn test_dispatch_to_unknown_channel_fails() {
    init_test_tracing();
    let router: EventRouter<()> = EventRouter::new();
    let err = router
        .dispatch(&ChannelId::named("never-created"), EVENT1, &())
        .unwrap_err();

    assert!(matches!(err, BusError::ChannelNotFound(ref id) if id == &ChannelId::named("never-created")));
}

#[test]
fn test_unlisten_on_unknown_channel_is_tolerated() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<()>::new();
    let cb = recorder.listener("callback1");

    assert!(!router.unlisten(&unique_channel(), EVENT1, &cb, &Context::none()));
}

#[test]
fn test_listen_requires_existing_channel() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<()>::new();
    let id = unique_channel();

    let err = router
        .listen(&id, EVENT1, recorder.listener("early"), Context::none())
        .unwrap_err();
    assert!(err.is_not_found());

    router.channel(Some(id.clone()));
    router
        .listen(&id, EVENT1, recorder.listener("late"), Context::none())
        .unwrap();
    router.dispatch(&id, EVENT1, &()).unwrap();
    assert_eq!(recorder.tags(), vec!["late"]);
}

#[test]
fn test_channels_do_not_leak_into_each_other() {
    init_test_tracing();
    let router = EventRouter::new();
    let a = router.channel(None);
    let b = router.channel(None);
    let recorder = CallRecorder::<()>::new();

    router
        .listen(a.id(), EVENT1, recorder.listener("on-a"), Context::none())
        .unwrap();
    router
        .listen(b.id(), EVENT1, recorder.listener("on-b"), Context::none())
        .unwrap();

    router.dispatch(b.id(), EVENT1, &()).unwrap();
    router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap();

    assert_eq!(recorder.tags(), vec!["on-b"]);
}

#[test]
fn test_destroyed_channel_forgets_listeners() {
    init_test_tracing();
    let router = EventRouter::new();
    let id = unique_channel();
    router.create_channel(id.clone()).unwrap();
    let recorder = CallRecorder::<()>::new();
    router
        .listen(&id, EVENT1, recorder.listener("callback1"), Context::none())
        .unwrap();

    assert!(router.destroy_channel(&id));
    assert!(router.dispatch(&id, EVENT1, &()).unwrap_err().is_not_found());

    let fresh = router.create_channel(id.clone()).unwrap();
    assert_eq!(fresh.total_listener_count(), 0);
    router.dispatch(&id, EVENT1, &()).unwrap();
    assert_eq!(recorder.total(), 0);
}

#[test]
fn test_named_payloads_route_themselves() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<DocumentEvent>::new();
    router
        .listen(&ChannelId::Default, DocumentEvent::SAVED, recorder.listener("saved"), Context::none())
        .unwrap();

    router
        .dispatch_event(&ChannelId::Default, &DocumentEvent::Opened("a.txt".into()))
        .unwrap();
    router
        .dispatch_event(&ChannelId::Default, &DocumentEvent::Saved("a.txt".into()))
        .unwrap();

    assert_eq!(
        recorder.payloads("saved"),
        vec![DocumentEvent::Saved("a.txt".into())]
    );
}

// ============================================================================
// Standalone Registry
// ============================================================================

#[test]
fn test_standalone_registry_with_event_values() {
    init_test_tracing();
    let registry: ListenerRegistry<Event<u32>> = ListenerRegistry::new();
    let recorder = CallRecorder::<Event<u32>>::new();
    let handle = registry.listen("ready", recorder.listener("ready"), Context::none());

    registry.dispatch_event(&Event::new("ready").with_target(1)).unwrap();
    assert!(registry.unlisten_by_handle(&handle));
    registry.dispatch_event(&Event::new("ready").with_target(2)).unwrap();

    assert_eq!(
        recorder.payloads("ready"),
        vec![Event::new("ready").with_target(1)]
    );
}

// ============================================================================
// Re-entrancy
// ============================================================================

#[test]
fn test_one_shot_listener_removes_itself() {
    init_test_tracing();
    let router = Arc::new(EventRouter::new());
    let fired = Arc::new(AtomicUsize::new(0));
    let own: Arc<OnceLock<ListenerHandle<()>>> = Arc::new(OnceLock::new());

    let once = {
        let router = Arc::clone(&router);
        let fired = Arc::clone(&fired);
        let own = Arc::clone(&own);
        callback(move |_, _: &()| {
            fired.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = own.get() {
                router.unlisten_by_handle(&ChannelId::Default, handle);
            }
            Ok(())
        })
    };
    let recorder = CallRecorder::<()>::new();

    own.set(router.listen(&ChannelId::Default, EVENT1, once, Context::none()).unwrap())
        .unwrap();
    router
        .listen(&ChannelId::Default, EVENT1, recorder.listener("steady"), Context::none())
        .unwrap();

    for _ in 0..3 {
        router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap();
    }

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.count("steady"), 3);
}

#[test]
fn test_listener_removing_a_later_listener_does_not_skip_or_repeat() {
    init_test_tracing();
    let router = Arc::new(EventRouter::new());
    let recorder = CallRecorder::<()>::new();
    let victim = recorder.listener("victim");

    let remover = {
        let router = Arc::clone(&router);
        let victim = Arc::clone(&victim);
        let inner = recorder.listener("remover");
        callback(move |ctx, payload: &()| {
            inner(ctx, payload)?;
            router.unlisten(&ChannelId::Default, EVENT1, &victim, &Context::none());
            Ok(())
        })
    };

    router
        .listen(&ChannelId::Default, EVENT1, remover, Context::none())
        .unwrap();
    router
        .listen(&ChannelId::Default, EVENT1, Arc::clone(&victim), Context::none())
        .unwrap();

    router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap();
    assert_eq!(recorder.tags(), vec!["remover", "victim"]);

    recorder.reset();
    router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap();
    assert_eq!(recorder.tags(), vec!["remover"]);
}

#[test]
fn test_listener_dispatches_onto_another_channel() {
    init_test_tracing();
    let router = Arc::new(EventRouter::new());
    let audit = router.channel(Some(unique_channel()));
    let recorder = CallRecorder::<Message>::new();
    router
        .listen(audit.id(), "audit", recorder.listener("audit"), Context::none())
        .unwrap();

    let forward = {
        let router = Arc::clone(&router);
        let audit_id = audit.id().clone();
        callback(move |_, message: &Message| {
            router.dispatch(&audit_id, "audit", message)?;
            Ok(())
        })
    };
    router
        .listen(&ChannelId::Default, "message", forward, Context::none())
        .unwrap();

    let message = Message::unique("forwarded");
    router
        .dispatch(&ChannelId::Default, "message", &message)
        .unwrap();

    assert_eq!(recorder.payloads("audit"), vec![message]);
}

// ============================================================================
// Listener Failures
// ============================================================================

#[test]
fn test_failing_listener_aborts_pass_by_default() {
    init_test_tracing();
    let router = EventRouter::new();
    let recorder = CallRecorder::<()>::new();
    router
        .listen(&ChannelId::Default, EVENT1, recorder.listener("before"), Context::none())
        .unwrap();
    router
        .listen(
            &ChannelId::Default,
            EVENT1,
            callback(|_, _: &()| Err(anyhow::anyhow!("listener rejected event"))),
            Context::none(),
        )
        .unwrap();
    router
        .listen(&ChannelId::Default, EVENT1, recorder.listener("after"), Context::none())
        .unwrap();

    let err = router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap_err();

    assert_eq!(err.code(), "LISTENER_FAILED");
    assert_eq!(recorder.tags(), vec!["before"]);
}

#[test]
fn test_isolated_failures_do_not_stop_delivery() {
    init_test_tracing();
    let router = EventRouter::with_options(
        RegistryOptions::default().error_policy(ErrorPolicy::Isolate),
    );
    let recorder = CallRecorder::<()>::new();
    router
        .listen(
            &ChannelId::Default,
            EVENT1,
            callback(|_, _: &()| Err(anyhow::anyhow!("listener rejected event"))),
            Context::none(),
        )
        .unwrap();
    router
        .listen(&ChannelId::Default, EVENT1, recorder.listener("after"), Context::none())
        .unwrap();

    assert_eq!(router.dispatch(&ChannelId::Default, EVENT1, &()).unwrap(), 2);
    assert_eq!(recorder.tags(), vec!["after"]);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_router_from_config() {
    init_test_tracing();
    let config = BusConfig::from_json(
        r#"{
            "allow_duplicate_listeners": true,
            "listener_errors": "isolate",
            "channels": ["channel0"]
        }"#,
    )
    .unwrap();
    let router: EventRouter<()> = config.build_router();
    let recorder = CallRecorder::<()>::new();
    let cb = recorder.listener("twice");
    let channel0 = ChannelId::named(CHANNEL0);

    router
        .listen(&channel0, EVENT1, Arc::clone(&cb), Context::none())
        .unwrap();
    router
        .listen(&channel0, EVENT1, Arc::clone(&cb), Context::none())
        .unwrap();
    router.dispatch(&channel0, EVENT1, &()).unwrap();

    assert_eq!(recorder.count("twice"), 2);
}

// ============================================================================
// Threads
// ============================================================================

#[test]
fn test_shared_router_across_threads() {
    init_test_tracing();
    let router: Arc<EventRouter<u64>> = EventRouter::new_shared();
    let total = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let router = Arc::clone(&router);
            let total = Arc::clone(&total);
            thread::spawn(move || {
                let id = ChannelId::named(format!("worker-{worker}"));
                router.channel(Some(id.clone()));
                let sum = Arc::clone(&total);
                router
                    .listen(
                        &id,
                        "work",
                        callback(move |_, amount: &u64| {
                            sum.fetch_add(usize::try_from(*amount)?, Ordering::SeqCst);
                            Ok(())
                        }),
                        Context::none(),
                    )
                    .unwrap();
                for _ in 0..100 {
                    router.dispatch(&id, "work", &1).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    assert_eq!(total.load(Ordering::SeqCst), 400);
    assert_eq!(router.channel_count(), 5);
}
