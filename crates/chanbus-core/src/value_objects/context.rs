//! Invocation context - the receiver a listener callback is bound to

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Receiver bound to a listener callback
///
/// Compared by pointer identity: two contexts are equal only if they wrap the
/// same allocation, or if both are unbound.
#[derive(Clone, Default)]
pub struct Context(Option<Arc<dyn Any + Send + Sync>>);

impl Context {
    /// An unbound context
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Bind a receiver
    #[must_use]
    pub fn new<T: Any + Send + Sync>(receiver: T) -> Self {
        Self(Some(Arc::new(receiver)))
    }

    /// Bind an already shared receiver, keeping its identity
    #[must_use]
    pub fn from_arc<T: Any + Send + Sync>(receiver: Arc<T>) -> Self {
        Self(Some(receiver))
    }

    /// Check if a receiver is bound
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.0.is_some()
    }

    /// Borrow the receiver as `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|receiver| receiver.downcast_ref::<T>())
    }

    /// Reference identity
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("Context(none)"),
            Some(receiver) => write!(f, "Context({:p})", Arc::as_ptr(receiver)),
        }
    }
}

impl<T: Any + Send + Sync> From<Arc<T>> for Context {
    fn from(receiver: Arc<T>) -> Self {
        Self::from_arc(receiver)
    }
}
