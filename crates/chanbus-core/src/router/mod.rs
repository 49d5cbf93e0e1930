//! Channel routing

mod event_router;

pub use event_router::EventRouter;
