//! Declarative state adapters.
//!
//! An [`Adapter`] is a pure description of one state slice: a set of named
//! *reducers* `(state, payload) → state` and a set of named *selectors*
//! `(state) → value`. It is data, not running state — the live engine that
//! applies reducers and broadcasts selector values lives in the runtime
//! crate, and any number of store instances can share one adapter.
//!
//! Payload and selector output types are recorded at registration so that
//! wiring mistakes (binding a source of the wrong payload type, reading a
//! selector as the wrong type) surface as construction-time errors instead
//! of silent misbehavior.

use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building or using an [`Adapter`].
///
/// All of these are programmer errors: they indicate a malformed adapter
/// definition or a wiring mistake, never a runtime data problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Two reducers were registered under the same name.
    #[error("duplicate reducer '{name}'")]
    DuplicateReducer {
        /// The conflicting reducer name.
        name: String,
    },

    /// Two selectors were registered under the same name.
    #[error("duplicate selector '{name}'")]
    DuplicateSelector {
        /// The conflicting selector name.
        name: String,
    },

    /// Joining adapters produced the same name twice (lifted reducer or
    /// selector, whole-slice selector, or joined selector).
    ///
    /// Collisions are ambiguous by construction and are rejected loudly at
    /// assembly time rather than silently shadowed.
    #[error("name collision while joining adapters: '{name}'")]
    NameCollision {
        /// The colliding name, already field-qualified where applicable.
        name: String,
    },

    /// No reducer is registered under the given name.
    #[error("unknown reducer '{name}'")]
    UnknownReducer {
        /// The requested reducer name.
        name: String,
    },

    /// No selector is registered under the given name.
    #[error("unknown selector '{name}'")]
    UnknownSelector {
        /// The requested selector name.
        name: String,
    },

    /// A reducer was invoked with a payload of the wrong type.
    #[error("reducer '{reducer}' expects payload of type {expected}")]
    PayloadTypeMismatch {
        /// The reducer name.
        reducer: String,
        /// The payload type the reducer was registered with.
        expected: &'static str,
    },

    /// A selector value was requested as a type other than the one the
    /// selector produces.
    #[error("selector '{selector}' produces {produced}, requested {requested}")]
    SelectorTypeMismatch {
        /// The selector name.
        selector: String,
        /// The output type the selector was registered with.
        produced: &'static str,
        /// The type the caller asked for.
        requested: &'static str,
    },
}

type ApplyFn<S> = Arc<dyn Fn(&S, &dyn Any) -> Option<S> + Send + Sync>;
type SelectFn<S> = Arc<dyn Fn(&S) -> Box<dyn Any + Send + Sync> + Send + Sync>;

pub(crate) struct ReducerSpec<S> {
    pub(crate) payload: TypeId,
    pub(crate) payload_type: &'static str,
    pub(crate) apply: ApplyFn<S>,
}

impl<S> Clone for ReducerSpec<S> {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload,
            payload_type: self.payload_type,
            apply: Arc::clone(&self.apply),
        }
    }
}

pub(crate) struct SelectorSpec<S> {
    pub(crate) output: TypeId,
    pub(crate) output_type: &'static str,
    pub(crate) select: SelectFn<S>,
}

impl<S> Clone for SelectorSpec<S> {
    fn clone(&self) -> Self {
        Self {
            output: self.output,
            output_type: self.output_type,
            select: Arc::clone(&self.select),
        }
    }
}

/// A pure specification of state transitions and derived reads for one state
/// shape.
///
/// Built with [`Adapter::builder`] or by joining sub-adapters with
/// [`crate::join`]. Cloning is cheap (the registered functions are shared).
pub struct Adapter<S> {
    pub(crate) reducers: BTreeMap<String, ReducerSpec<S>>,
    pub(crate) selectors: BTreeMap<String, SelectorSpec<S>>,
}

impl<S> Clone for Adapter<S> {
    fn clone(&self) -> Self {
        Self {
            reducers: self.reducers.clone(),
            selectors: self.selectors.clone(),
        }
    }
}

impl<S> std::fmt::Debug for Adapter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("reducers", &self.reducers.keys().collect::<Vec<_>>())
            .field("selectors", &self.selectors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S: 'static> Adapter<S> {
    /// Start building an adapter for state type `S`.
    #[must_use]
    pub fn builder() -> AdapterBuilder<S> {
        AdapterBuilder {
            reducers: Vec::new(),
            selectors: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        reducers: BTreeMap<String, ReducerSpec<S>>,
        selectors: BTreeMap<String, SelectorSpec<S>>,
    ) -> Self {
        Self {
            reducers,
            selectors,
        }
    }

    /// Apply the named reducer to `state` with a type-erased payload and
    /// return the new state. The input state is never mutated.
    ///
    /// # Errors
    ///
    /// [`AdapterError::UnknownReducer`] if no reducer has that name,
    /// [`AdapterError::PayloadTypeMismatch`] if the payload is not the type
    /// the reducer was registered with.
    pub fn reduce(&self, name: &str, state: &S, payload: &dyn Any) -> Result<S, AdapterError> {
        let spec = self
            .reducers
            .get(name)
            .ok_or_else(|| AdapterError::UnknownReducer { name: name.into() })?;

        (spec.apply)(state, payload).ok_or_else(|| AdapterError::PayloadTypeMismatch {
            reducer: name.into(),
            expected: spec.payload_type,
        })
    }

    /// Compute the named selector over `state`, returned type-erased.
    ///
    /// # Errors
    ///
    /// [`AdapterError::UnknownSelector`] if no selector has that name.
    pub fn select_any(
        &self,
        name: &str,
        state: &S,
    ) -> Result<Box<dyn Any + Send + Sync>, AdapterError> {
        let spec = self
            .selectors
            .get(name)
            .ok_or_else(|| AdapterError::UnknownSelector { name: name.into() })?;
        Ok((spec.select)(state))
    }

    /// Compute the named selector over `state` as its concrete output type.
    ///
    /// # Errors
    ///
    /// [`AdapterError::UnknownSelector`] if no selector has that name,
    /// [`AdapterError::SelectorTypeMismatch`] if `V` is not the registered
    /// output type.
    pub fn select<V: Send + Sync + 'static>(
        &self,
        name: &str,
        state: &S,
    ) -> Result<V, AdapterError> {
        let spec = self
            .selectors
            .get(name)
            .ok_or_else(|| AdapterError::UnknownSelector { name: name.into() })?;

        if spec.output != TypeId::of::<V>() {
            return Err(AdapterError::SelectorTypeMismatch {
                selector: name.into(),
                produced: spec.output_type,
                requested: type_name::<V>(),
            });
        }

        (spec.select)(state)
            .downcast::<V>()
            .map(|value| *value)
            .map_err(|_| AdapterError::SelectorTypeMismatch {
                selector: name.into(),
                produced: spec.output_type,
                requested: type_name::<V>(),
            })
    }

    /// The payload type of the named reducer, if it exists.
    #[must_use]
    pub fn reducer_payload(&self, name: &str) -> Option<(TypeId, &'static str)> {
        self.reducers
            .get(name)
            .map(|spec| (spec.payload, spec.payload_type))
    }

    /// The output type of the named selector, if it exists.
    #[must_use]
    pub fn selector_output(&self, name: &str) -> Option<(TypeId, &'static str)> {
        self.selectors
            .get(name)
            .map(|spec| (spec.output, spec.output_type))
    }

    /// Names of all registered reducers, in sorted order.
    pub fn reducer_names(&self) -> impl Iterator<Item = &str> {
        self.reducers.keys().map(String::as_str)
    }

    /// Names of all registered selectors, in sorted order.
    pub fn selector_names(&self) -> impl Iterator<Item = &str> {
        self.selectors.keys().map(String::as_str)
    }
}

/// Builder for [`Adapter`]. Duplicate names are rejected at [`build`].
///
/// [`build`]: AdapterBuilder::build
pub struct AdapterBuilder<S> {
    reducers: Vec<(String, ReducerSpec<S>)>,
    selectors: Vec<(String, SelectorSpec<S>)>,
}

impl<S: 'static> AdapterBuilder<S> {
    /// Register a reducer under `name`.
    ///
    /// The function must be pure: no side effects, no mutation of the input
    /// state. The payload type `P` is recorded for fail-fast wiring checks.
    #[must_use]
    pub fn reducer<P: 'static>(
        mut self,
        name: impl Into<String>,
        reduce: impl Fn(&S, &P) -> S + Send + Sync + 'static,
    ) -> Self {
        self.reducers.push((
            name.into(),
            ReducerSpec {
                payload: TypeId::of::<P>(),
                payload_type: type_name::<P>(),
                apply: Arc::new(move |state, payload| {
                    payload.downcast_ref::<P>().map(|payload| reduce(state, payload))
                }),
            },
        ));
        self
    }

    /// Register a selector under `name`.
    ///
    /// The function must be pure and ideally cheap — the runtime recomputes
    /// it on every state transition.
    #[must_use]
    pub fn selector<V: Send + Sync + 'static>(
        mut self,
        name: impl Into<String>,
        select: impl Fn(&S) -> V + Send + Sync + 'static,
    ) -> Self {
        self.selectors.push((
            name.into(),
            SelectorSpec {
                output: TypeId::of::<V>(),
                output_type: type_name::<V>(),
                select: Arc::new(move |state| Box::new(select(state))),
            },
        ));
        self
    }

    /// Finish building.
    ///
    /// # Errors
    ///
    /// [`AdapterError::DuplicateReducer`] or
    /// [`AdapterError::DuplicateSelector`] if a name was registered twice.
    pub fn build(self) -> Result<Adapter<S>, AdapterError> {
        let mut reducers = BTreeMap::new();
        for (name, spec) in self.reducers {
            if reducers.insert(name.clone(), spec).is_some() {
                return Err(AdapterError::DuplicateReducer { name });
            }
        }

        let mut selectors = BTreeMap::new();
        for (name, spec) in self.selectors {
            if selectors.insert(name.clone(), spec).is_some() {
                return Err(AdapterError::DuplicateSelector { name });
            }
        }

        Ok(Adapter::from_parts(reducers, selectors))
    }
}
