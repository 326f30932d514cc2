//! The Store — live engine for one adapter instance.
//!
//! A [`Store`] is assembled from an initial state, an [`Adapter`], and a set
//! of bindings from reducer names to [`Source`]s. For every event delivered
//! on a bound source the engine computes
//! `new_state = reducer(current_state, payload)`, replaces the current
//! state, and then synchronously notifies (a) the full-state stream and
//! (b) one stream per selector. Selector values are recomputed
//! unconditionally on every transition; filtering out unchanged values is a
//! consumer concern.
//!
//! Binding mistakes (unknown reducer name, payload type mismatch) fail
//! loudly at [`StoreBuilder::build`] rather than at event time.
//!
//! ## Lifetime
//!
//! The engine stays alive while any `Store` handle or subscription
//! references it. Bound sources hold only a weak reference, so an event
//! arriving after the last handle is dropped is a silent no-op — never a
//! crash, and the sources themselves remain usable.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use storelet_core::{Adapter, AdapterError, Source, Subscription};

use crate::error::StoreError;
use crate::key::StoreKey;
use crate::persist::Storage;

type DynValue = Arc<dyn Any + Send + Sync>;

struct Engine<S> {
    key: StoreKey,
    adapter: Adapter<S>,
    state: Mutex<S>,
    states: Source<S>,
    selectors: BTreeMap<String, Source<DynValue>>,
}

impl<S: Clone + Send + Sync + 'static> Engine<S> {
    fn dispatch(&self, reducer: &str, payload: &dyn Any) {
        let next = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match self.adapter.reduce(reducer, &state, payload) {
                Ok(next) => {
                    *state = next.clone();
                    next
                },
                Err(err) => {
                    tracing::error!(store = %self.key, reducer, %err, "transition failed");
                    return;
                },
            }
        };

        tracing::trace!(store = %self.key, reducer, "state transition");

        // Notify outside the state lock: subscribers may read the store or
        // emit further events.
        self.states.emit(next.clone());

        for (name, stream) in &self.selectors {
            match self.adapter.select_any(name, &next) {
                Ok(value) => stream.emit(DynValue::from(value)),
                Err(err) => {
                    tracing::error!(store = %self.key, selector = name, %err, "selector failed");
                },
            }
        }
    }
}

/// The live, observable store for one adapter instance.
///
/// Cloning yields another handle to the same engine. See the crate docs for
/// a usage example.
pub struct Store<S> {
    engine: Arc<Engine<S>>,
    _bindings: Arc<Vec<Subscription>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            _bindings: Arc::clone(&self._bindings),
        }
    }
}

impl<S> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("key", &self.engine.key).finish()
    }
}

impl<S: Clone + Send + Sync + 'static> Store<S> {
    /// Start assembling a store.
    ///
    /// `key` must be unique per instance (see
    /// [`KeyGenerator`](crate::KeyGenerator)); `initial` is used unless a
    /// persisted state overrides it at build time.
    #[must_use]
    pub fn builder(key: StoreKey, initial: S, adapter: Adapter<S>) -> StoreBuilder<S> {
        StoreBuilder {
            key,
            initial,
            adapter,
            bindings: Vec::new(),
            persistence: None,
        }
    }

    /// This instance's unique key.
    #[must_use]
    pub fn key(&self) -> &StoreKey {
        &self.engine.key
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> S {
        self.engine
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Compute the named selector over the current state, now.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Adapter`] if the selector is unknown or `V` is
    /// not its output type.
    pub fn selector<V: Send + Sync + 'static>(&self, name: &str) -> Result<V, StoreError> {
        let state = self
            .engine
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(self.engine.adapter.select(name, &state)?)
    }

    /// Subscribe to the continuously-updated full-state stream.
    ///
    /// Late subscribers miss past transitions; read [`Store::state`] for the
    /// current value.
    pub fn on_state(&self, callback: impl Fn(&S) + Send + Sync + 'static) -> Subscription {
        self.engine.states.subscribe(callback)
    }

    /// Subscribe to the named selector's derived-value stream.
    ///
    /// The callback fires on every transition with the freshly recomputed
    /// value, whether or not it changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Adapter`] if the selector is unknown or `V` is
    /// not its output type.
    pub fn on_selector<V: Send + Sync + 'static>(
        &self,
        name: &str,
        callback: impl Fn(&V) + Send + Sync + 'static,
    ) -> Result<Subscription, StoreError> {
        let (output, output_type) = self
            .engine
            .adapter
            .selector_output(name)
            .ok_or_else(|| AdapterError::UnknownSelector { name: name.into() })?;

        if output != TypeId::of::<V>() {
            return Err(AdapterError::SelectorTypeMismatch {
                selector: name.into(),
                produced: output_type,
                requested: type_name::<V>(),
            }
            .into());
        }

        let stream = self
            .engine
            .selectors
            .get(name)
            .ok_or_else(|| AdapterError::UnknownSelector { name: name.into() })?;

        Ok(stream.subscribe(move |value: &DynValue| {
            if let Some(value) = value.downcast_ref::<V>() {
                callback(value);
            }
        }))
    }
}

struct Binding<S> {
    reducer: String,
    source_name: String,
    payload: TypeId,
    payload_type: &'static str,
    attach: Box<dyn FnOnce(Weak<Engine<S>>) -> Subscription>,
}

struct Persistence<S> {
    storage_key: String,
    storage: Arc<dyn Storage>,
    decode: fn(&str) -> Result<S, serde_json::Error>,
    encode: fn(&S) -> Result<String, serde_json::Error>,
}

/// Builder returned by [`Store::builder`].
pub struct StoreBuilder<S> {
    key: StoreKey,
    initial: S,
    adapter: Adapter<S>,
    bindings: Vec<Binding<S>>,
    persistence: Option<Persistence<S>>,
}

impl<S: Clone + Send + Sync + 'static> StoreBuilder<S> {
    /// Bind every emission of `source` to the reducer named `reducer`.
    ///
    /// The reducer's existence and payload type are verified at
    /// [`build`](Self::build).
    #[must_use]
    pub fn on<P: Send + Sync + 'static>(mut self, reducer: &str, source: &Source<P>) -> Self {
        let reducer = reducer.to_string();
        let source_name = source.name().to_string();
        let source = source.clone();
        let dispatch_as = reducer.clone();

        self.bindings.push(Binding {
            reducer,
            source_name,
            payload: TypeId::of::<P>(),
            payload_type: type_name::<P>(),
            attach: Box::new(move |engine: Weak<Engine<S>>| {
                source.subscribe(move |payload: &P| {
                    // Engine gone means the store was dropped while the
                    // source outlived it; skip and continue.
                    if let Some(engine) = engine.upgrade() {
                        engine.dispatch(&dispatch_as, payload);
                    }
                })
            }),
        });
        self
    }

    /// Persist this store's state under the fixed `storage_key`.
    ///
    /// On build, a previously saved value replaces the caller-supplied
    /// initial state; a corrupt or unreadable value is logged and the
    /// default is used instead. Afterwards every transition is serialized to
    /// `storage` by a state-stream subscriber; save failures are logged and
    /// otherwise silent.
    #[must_use]
    pub fn persisted(mut self, storage_key: impl Into<String>, storage: Arc<dyn Storage>) -> Self
    where
        S: Serialize + DeserializeOwned,
    {
        self.persistence = Some(Persistence {
            storage_key: storage_key.into(),
            storage,
            decode: |raw| serde_json::from_str(raw),
            encode: |state| serde_json::to_string(state),
        });
        self
    }

    /// Validate all bindings, resolve the initial state, and bring the
    /// engine live.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownReducer`] or
    /// [`StoreError::BindingTypeMismatch`] for wiring mistakes.
    pub fn build(self) -> Result<Store<S>, StoreError> {
        let Self {
            key,
            initial,
            adapter,
            bindings,
            persistence,
        } = self;

        for binding in &bindings {
            let (payload, payload_type) = adapter
                .reducer_payload(&binding.reducer)
                .ok_or_else(|| StoreError::UnknownReducer {
                    source_name: binding.source_name.clone(),
                    reducer: binding.reducer.clone(),
                })?;
            if payload != binding.payload {
                return Err(StoreError::BindingTypeMismatch {
                    source_name: binding.source_name.clone(),
                    reducer: binding.reducer.clone(),
                    expected: payload_type,
                    actual: binding.payload_type,
                });
            }
        }

        let initial = match &persistence {
            Some(persistence) => match persistence.storage.load(&persistence.storage_key) {
                Ok(Some(raw)) => match (persistence.decode)(&raw) {
                    Ok(state) => {
                        tracing::debug!(
                            store = %key,
                            storage_key = %persistence.storage_key,
                            "restored persisted state"
                        );
                        state
                    },
                    Err(err) => {
                        tracing::warn!(
                            store = %key,
                            storage_key = %persistence.storage_key,
                            %err,
                            "persisted state unreadable, falling back to initial state"
                        );
                        initial
                    },
                },
                Ok(None) => initial,
                Err(err) => {
                    tracing::warn!(
                        store = %key,
                        storage_key = %persistence.storage_key,
                        %err,
                        "storage load failed, falling back to initial state"
                    );
                    initial
                },
            },
            None => initial,
        };

        let selector_names: Vec<String> =
            adapter.selector_names().map(str::to_string).collect();
        let selectors = selector_names
            .into_iter()
            .map(|name| {
                let stream = Source::new(format!("{key}.{name}"));
                (name, stream)
            })
            .collect();

        let engine = Arc::new(Engine {
            states: Source::new(format!("{key}.state")),
            key,
            adapter,
            state: Mutex::new(initial),
            selectors,
        });

        let mut subscriptions = Vec::with_capacity(bindings.len() + 1);

        if let Some(persistence) = persistence {
            let Persistence {
                storage_key,
                storage,
                encode,
                ..
            } = persistence;
            let store_key = engine.key.clone();
            subscriptions.push(engine.states.subscribe(move |state: &S| {
                match encode(state) {
                    Ok(raw) => {
                        if let Err(err) = storage.save(&storage_key, &raw) {
                            tracing::error!(
                                store = %store_key,
                                storage_key = %storage_key,
                                %err,
                                "state save failed"
                            );
                        }
                    },
                    Err(err) => {
                        tracing::error!(
                            store = %store_key,
                            storage_key = %storage_key,
                            %err,
                            "state serialization failed"
                        );
                    },
                }
            }));
        }

        // Bindings attach here, before any caller-side subscriber can exist,
        // so sampled-on-event observers always see post-transition state.
        for binding in bindings {
            subscriptions.push((binding.attach)(Arc::downgrade(&engine)));
        }

        Ok(Store {
            engine,
            _bindings: Arc::new(subscriptions),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::key::KeyGenerator;

    fn counter_adapter() -> Adapter<i64> {
        Adapter::builder()
            .reducer("add", |count, amount: &i64| count + amount)
            .reducer("reset", |_count, (): &()| 0)
            .selector("doubled", |count| count * 2)
            .build()
            .unwrap()
    }

    fn keys() -> KeyGenerator {
        KeyGenerator::new()
    }

    #[test]
    fn bound_events_drive_transitions() {
        let add = Source::new("add");
        let reset = Source::new("reset");
        let store = Store::builder(keys().key("counter"), 0, counter_adapter())
            .on::<i64>("add", &add)
            .on::<()>("reset", &reset)
            .build()
            .unwrap();

        add.emit(5);
        add.emit(7);
        assert_eq!(store.state(), 12);

        reset.emit(());
        assert_eq!(store.state(), 0);
    }

    #[test]
    fn state_stream_sees_every_transition() {
        let add = Source::new("add");
        let store = Store::builder(keys().key("counter"), 0, counter_adapter())
            .on::<i64>("add", &add)
            .build()
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.on_state(move |state: &i64| sink.lock().unwrap().push(*state));

        add.emit(1);
        add.emit(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn selector_stream_recomputes_unconditionally() {
        let add = Source::new("add");
        let store = Store::builder(keys().key("counter"), 0, counter_adapter())
            .on::<i64>("add", &add)
            .build()
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store
            .on_selector::<i64>("doubled", move |value| sink.lock().unwrap().push(*value))
            .unwrap();

        add.emit(3);
        add.emit(0); // unchanged value is still re-emitted
        assert_eq!(*seen.lock().unwrap(), vec![6, 6]);
    }

    #[test]
    fn selector_snapshot_reads_current_state() {
        let add = Source::new("add");
        let store = Store::builder(keys().key("counter"), 20, counter_adapter())
            .on::<i64>("add", &add)
            .build()
            .unwrap();

        add.emit(1);
        assert_eq!(store.selector::<i64>("doubled").unwrap(), 42);
    }

    #[test]
    fn binding_unknown_reducer_fails_at_build() {
        let missing = Source::new("missing");
        let err = Store::builder(keys().key("counter"), 0, counter_adapter())
            .on::<i64>("subtract", &missing)
            .build()
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownReducer { .. }));
        assert_eq!(
            err.to_string(),
            "cannot bind source 'missing': no reducer named 'subtract'"
        );
        // A wiring error carries no underlying cause.
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn binding_wrong_payload_type_fails_at_build() {
        let add = Source::new("add");
        let err = Store::builder(keys().key("counter"), 0, counter_adapter())
            .on::<String>("add", &add)
            .build()
            .unwrap_err();
        assert!(matches!(err, StoreError::BindingTypeMismatch { .. }));
        assert!(err.to_string().contains("cannot bind source 'add'"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn selector_subscription_type_is_checked() {
        let store = Store::builder(keys().key("counter"), 0, counter_adapter())
            .build()
            .unwrap();
        let err = store.on_selector::<String>("doubled", |_| {}).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Adapter(AdapterError::SelectorTypeMismatch { .. })
        ));
    }

    #[test]
    fn store_handles_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Store<i64>>();
    }

    #[test]
    fn events_after_store_drop_are_no_ops() {
        let add = Source::new("add");
        let store = Store::builder(keys().key("counter"), 0, counter_adapter())
            .on::<i64>("add", &add)
            .build()
            .unwrap();

        drop(store);
        add.emit(1); // must not crash
    }

    #[test]
    fn two_instances_of_one_adapter_are_independent() {
        let adapter = counter_adapter();
        let generator = keys();
        let add_a = Source::new("add-a");
        let add_b = Source::new("add-b");

        let a = Store::builder(generator.key("counter"), 0, adapter.clone())
            .on::<i64>("add", &add_a)
            .build()
            .unwrap();
        let b = Store::builder(generator.key("counter"), 100, adapter)
            .on::<i64>("add", &add_b)
            .build()
            .unwrap();

        add_a.emit(1);
        add_b.emit(2);
        assert_eq!(a.state(), 1);
        assert_eq!(b.state(), 102);
        assert_ne!(a.key(), b.key());
    }
}
