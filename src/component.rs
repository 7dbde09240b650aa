//! Synchronous publish/subscribe primitive shared by every component.
//!
//! A [`Component`] is a small event bus keyed by a closed set of event kinds
//! (`K`, an enum implementing [`EventKind`]) with a single payload type `P`.
//! Inputs, encoders and potentiometers each embed one.
//!
//! # Dispatch Semantics
//!
//! - Subscribers for a kind run in subscription order, one after the other.
//! - Dispatch is fully synchronous on the publishing thread. The subscriber
//!   table is snapshotted and unlocked before any callback runs, so a
//!   callback may publish (re-entrantly) or subscribe without deadlocking.
//!   Subscriptions made during a dispatch only see later publishes.
//! - Failures follow the component's [`DispatchPolicy`].
//!
//! # Example
//!
//! ```rust
//! use rs_knob::{Component, EncoderEvent};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let bus: Component<EncoderEvent, ()> = Component::new();
//! let lefts = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&lefts);
//! bus.subscribe(EncoderEvent::RotateLeft, move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! assert_eq!(bus.publish(EncoderEvent::RotateLeft, ()).unwrap(), 1);
//! assert_eq!(bus.publish(EncoderEvent::RotateRight, ()).unwrap(), 0);
//! assert_eq!(lefts.load(Ordering::SeqCst), 1);
//! ```

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::DispatchError;

/// A closed set of event names published by one kind of component.
pub trait EventKind: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Canonical upper-case event name, used in logs and errors.
    fn as_str(&self) -> &'static str;
}

/// Event object handed to subscribers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event<K, P> {
    /// Which event fired.
    pub kind: K,
    /// Payload carried by the event (`()` when there is none).
    pub value: P,
}

/// Shared, type-erased subscriber callback.
pub type Handler<K, P> = Arc<dyn Fn(&Event<K, P>) -> anyhow::Result<()> + Send + Sync>;

/// Handle returned by [`Component::subscribe`], used to unsubscribe.
///
/// Ids are unique across all components in the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What happens when a subscriber returns an error during dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DispatchPolicy {
    /// Stop at the first failing subscriber and return the error to the
    /// publisher.
    #[default]
    FailFast,
    /// Log the failure and keep dispatching to the remaining subscribers.
    Isolate,
}

struct Subscriber<K, P> {
    id: SubscriptionId,
    kind: K,
    handler: Handler<K, P>,
}

/// Event bus over event kinds `K` carrying payloads of type `P`.
pub struct Component<K, P> {
    subscribers: Mutex<Vec<Subscriber<K, P>>>,
    policy: DispatchPolicy,
}

impl<K: EventKind, P> Default for Component<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EventKind, P> Component<K, P> {
    /// Creates an empty bus using [`DispatchPolicy::FailFast`].
    pub fn new() -> Self {
        Self::with_policy(DispatchPolicy::FailFast)
    }

    /// Creates an empty bus with the given failure policy.
    pub fn with_policy(policy: DispatchPolicy) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            policy,
        }
    }

    /// The failure policy this bus dispatches with.
    #[inline]
    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Registers `callback` for `kind`. Registering the same closure twice
    /// makes it run twice.
    pub fn subscribe<F>(&self, kind: K, callback: F) -> SubscriptionId
    where
        F: Fn(&Event<K, P>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribe_handler(kind, Arc::new(callback))
    }

    /// Registers an already type-erased handler for `kind`.
    pub fn subscribe_handler(&self, kind: K, handler: Handler<K, P>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.table().push(Subscriber { id, kind, handler });
        id
    }

    /// Removes the subscription with `id`. Returns `false` if it was not
    /// registered on this bus.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut table = self.table();
        match table.iter().position(|s| s.id == id) {
            Some(index) => {
                table.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of subscribers currently registered for `kind`.
    pub fn subscriber_count(&self, kind: K) -> usize {
        self.table().iter().filter(|s| s.kind == kind).count()
    }

    /// Invokes every subscriber registered for `kind`, in order.
    ///
    /// Returns how many subscribers completed successfully. Under
    /// [`DispatchPolicy::FailFast`] the first failure aborts the dispatch and
    /// is returned as a [`DispatchError`].
    pub fn publish(&self, kind: K, value: P) -> Result<usize, DispatchError> {
        let handlers: Vec<Handler<K, P>> = self
            .table()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Arc::clone(&s.handler))
            .collect();

        let event = Event { kind, value };
        let mut delivered = 0;
        for (index, handler) in handlers.iter().enumerate() {
            match handler(&event) {
                Ok(()) => delivered += 1,
                Err(err) => match self.policy {
                    DispatchPolicy::FailFast => {
                        return Err(DispatchError::new(kind.as_str(), index, err));
                    }
                    DispatchPolicy::Isolate => {
                        tracing::warn!(
                            event = kind.as_str(),
                            subscriber = index,
                            error = %err,
                            "subscriber failed; continuing dispatch"
                        );
                    }
                },
            }
        }
        Ok(delivered)
    }

    fn table(&self) -> MutexGuard<'_, Vec<Subscriber<K, P>>> {
        // A panicking subscriber never runs under this lock, so the table is
        // always consistent.
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: EventKind, P> fmt::Debug for Component<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("subscribers", &self.table().len())
            .field("policy", &self.policy)
            .finish()
    }
}
