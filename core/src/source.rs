//! Named multicast event sources.
//!
//! A [`Source`] is the single channel type for everything that drives a
//! store: UI-originated triggers and programmatic command functions alike.
//! Delivery is synchronous push with no buffering — every current subscriber
//! sees the payload before [`Source::emit`] returns, and late subscribers
//! miss past emissions entirely.
//!
//! # Delivery order
//!
//! Within one emission, subscribers are invoked in subscription order. The
//! runtime relies on this: a store binds its reducer before any
//! sampled-on-event observer subscribes, so observers always see the
//! post-transition state.

use smallvec::SmallVec;
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T> {
    next_id: u64,
    entries: SmallVec<[(u64, Callback<T>); 2]>,
}

impl<T> Subscribers<T> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: SmallVec::new(),
        }
    }
}

/// A named, multicast, synchronous-push channel of discrete payloads.
///
/// Cloning a `Source` is cheap and shares the subscriber list, so the same
/// logical channel can be handed to both the emitting side (a command
/// function) and the consuming side (a store binding).
///
/// # Example
///
/// ```
/// use storelet_core::Source;
///
/// let clicks = Source::new("clicks");
/// let seen = std::sync::Arc::new(std::sync::Mutex::new(0u32));
///
/// let sink = std::sync::Arc::clone(&seen);
/// let sub = clicks.subscribe(move |n: &u32| {
///     *sink.lock().unwrap() += n;
/// });
///
/// clicks.emit(2);
/// clicks.emit(3);
/// assert_eq!(*seen.lock().unwrap(), 5);
///
/// drop(sub); // detaches
/// clicks.emit(100);
/// assert_eq!(*seen.lock().unwrap(), 5);
/// ```
pub struct Source<T> {
    name: Arc<str>,
    subscribers: Arc<Mutex<Subscribers<T>>>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T> std::fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source").field("name", &self.name).finish()
    }
}

impl<T: 'static> Source<T> {
    /// Create a new source with no subscribers.
    ///
    /// The name only serves diagnostics (tracing output, debug formatting);
    /// it does not have to be unique.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            subscribers: Arc::new(Mutex::new(Subscribers::new())),
        }
    }

    /// The diagnostic name this source was created with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of currently attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Deliver `payload` to every current subscriber, synchronously and in
    /// subscription order.
    ///
    /// Callbacks run outside the internal lock, so a subscriber may emit on
    /// other sources or subscribe to this one without deadlocking. The
    /// subscriber list is snapshotted up front: subscribers added during an
    /// emission do not see it, and one detached mid-emission is still
    /// delivered to once.
    pub fn emit(&self, payload: T) {
        let callbacks: SmallVec<[Callback<T>; 2]> = self
            .lock()
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        tracing::trace!(source = %self.name, subscribers = callbacks.len(), "emit");

        for callback in callbacks {
            callback(&payload);
        }
    }

    /// Attach a subscriber. It stays attached until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut subscribers = self.lock();
            let id = subscribers.next_id;
            subscribers.next_id += 1;
            subscribers.entries.push((id, Arc::new(callback)));
            id
        };

        let weak: Weak<Mutex<Subscribers<T>>> = Arc::downgrade(&self.subscribers);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(subscribers) = weak.upgrade() {
                    let mut subscribers = subscribers
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    subscribers.entries.retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Subscribers<T>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to an attached subscriber.
///
/// Dropping the subscription detaches the subscriber; it is not invoked for
/// any later emission. An emission already in progress delivers from a
/// snapshot of the subscriber list, so a subscriber detached mid-emission by
/// an earlier callback still sees that one payload. The handle is type-erased
/// so subscriptions to sources of different payload types can be kept in one
/// collection.
#[must_use = "dropping a Subscription immediately detaches the subscriber"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Detach now. Equivalent to dropping the subscription; provided for
    /// call sites where an explicit verb reads better.
    pub fn detach(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription")
    }
}
