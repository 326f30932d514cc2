//! Joining adapters over a composite state.
//!
//! [`join`] composes independently-defined adapters, keyed by field name,
//! into one [`Adapter`] over a composite state shape. Each sub-adapter's
//! reducers and selectors are lifted through a get/put lens so they operate
//! on their own field and return the full composite state with only that
//! field replaced.
//!
//! Lifted names are qualified as `"{field}.{name}"`, and every field also
//! contributes a whole-slice selector named after the field itself. Joined
//! selectors computed from several fields at once can be added on top. Any
//! remaining name collision is a construction-time error — never silent
//! shadowing.
//!
//! # Example
//!
//! ```
//! use storelet_core::{Adapter, join};
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     count: i64,
//!     label: String,
//! }
//!
//! let count = Adapter::<i64>::builder()
//!     .reducer("add", |count, amount: &i64| count + amount)
//!     .build()?;
//! let label = Adapter::<String>::builder()
//!     .reducer("set", |_label, next: &String| next.clone())
//!     .build()?;
//!
//! let app = join::<AppState>()
//!     .slice("count", count, |s| &s.count, |s, count| AppState {
//!         count,
//!         label: s.label.clone(),
//!     })
//!     .slice("label", label, |s| &s.label, |s, label| AppState {
//!         count: s.count,
//!         label,
//!     })
//!     .selector("banner", |s: &AppState| format!("{}: {}", s.label, s.count))
//!     .build()?;
//!
//! let state = app.reduce("count.add", &AppState::default(), &3i64)?;
//! let state = app.reduce("label.set", &state, &"total".to_string())?;
//! assert_eq!(app.select::<String>("banner", &state)?, "total: 3");
//! # Ok::<(), storelet_core::AdapterError>(())
//! ```

use crate::adapter::{Adapter, AdapterError, ReducerSpec, SelectorSpec};
use std::any::TypeId;
use std::any::type_name;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Start joining adapters over composite state type `S`.
#[must_use]
pub fn join<S: 'static>() -> Joiner<S> {
    Joiner {
        fields: Vec::new(),
        reducers: Vec::new(),
        selectors: Vec::new(),
    }
}

/// Builder returned by [`join`].
pub struct Joiner<S> {
    fields: Vec<String>,
    reducers: Vec<(String, ReducerSpec<S>)>,
    selectors: Vec<(String, SelectorSpec<S>)>,
}

impl<S: 'static> Joiner<S> {
    /// Mount `adapter` on the field named `field`, lifted through the
    /// `get`/`put` lens.
    ///
    /// `put` must return the composite state with only this field replaced.
    /// Every reducer and selector of the sub-adapter is re-registered as
    /// `"{field}.{name}"`; a selector named `field` returning the whole
    /// slice is added as well.
    #[must_use]
    pub fn slice<Sub: Clone + Send + Sync + 'static>(
        mut self,
        field: impl Into<String>,
        adapter: Adapter<Sub>,
        get: fn(&S) -> &Sub,
        put: fn(&S, Sub) -> S,
    ) -> Self {
        let field = field.into();

        for (name, spec) in adapter.reducers {
            let apply = Arc::clone(&spec.apply);
            self.reducers.push((
                format!("{field}.{name}"),
                ReducerSpec {
                    payload: spec.payload,
                    payload_type: spec.payload_type,
                    apply: Arc::new(move |state: &S, payload| {
                        apply(get(state), payload).map(|slice| put(state, slice))
                    }),
                },
            ));
        }

        for (name, spec) in adapter.selectors {
            let select = Arc::clone(&spec.select);
            self.selectors.push((
                format!("{field}.{name}"),
                SelectorSpec {
                    output: spec.output,
                    output_type: spec.output_type,
                    select: Arc::new(move |state: &S| select(get(state))),
                },
            ));
        }

        // Whole-slice selector, the per-field stream of the joined store.
        self.selectors.push((
            field.clone(),
            SelectorSpec {
                output: TypeId::of::<Sub>(),
                output_type: type_name::<Sub>(),
                select: Arc::new(move |state: &S| Box::new(get(state).clone())),
            },
        ));

        self.fields.push(field);
        self
    }

    /// Add a joined selector computed from the full composite state.
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

    /// Finish joining.
    ///
    /// # Errors
    ///
    /// [`AdapterError::NameCollision`] if two fields share a name, or if any
    /// two reducers or any two selectors ended up with the same qualified
    /// name (for example a joined selector clashing with a lifted one).
    pub fn build(self) -> Result<Adapter<S>, AdapterError> {
        let mut seen_fields = BTreeMap::new();
        for field in &self.fields {
            if seen_fields.insert(field.clone(), ()).is_some() {
                return Err(AdapterError::NameCollision {
                    name: field.clone(),
                });
            }
        }

        let mut reducers = BTreeMap::new();
        for (name, spec) in self.reducers {
            if reducers.insert(name.clone(), spec).is_some() {
                return Err(AdapterError::NameCollision { name });
            }
        }

        let mut selectors = BTreeMap::new();
        for (name, spec) in self.selectors {
            if selectors.insert(name.clone(), spec).is_some() {
                return Err(AdapterError::NameCollision { name });
            }
        }

        Ok(Adapter::from_parts(reducers, selectors))
    }
}
