//! The per-item controller: one ephemeral store per mounted list item.
//!
//! [`ItemEditor`] tracks whether its item is mid-edit and holds a read-only,
//! most-recently-pushed copy of the item's [`Todo`], supplied by the parent
//! via [`ItemEditor::set_todo`]. It never mutates the shared list directly:
//! it only emits intents on its outward `changed` and `removed` streams,
//! which the embedding layer feeds back into the list controller.
//!
//! The outward streams are sampled-on-event, not per state change: `changed`
//! fires with the latest todo whenever a done-toggle or text commit fires,
//! `removed` whenever destroy fires. Both stay silent until a todo has been
//! pushed. Sampling relies on source delivery order — the store's reducer
//! binding subscribes before the sampler, so the sampler always reads the
//! post-transition state.
//!
//! Focus acquisition after entering edit mode is a view concern: this
//! controller only exposes the `is_editing` stream. The embedding layer
//! defers the actual focus one tick via
//! [`Scheduler`](storelet_runtime::Scheduler) and must tolerate the target
//! being gone by then.

use storelet_core::{Adapter, AdapterError, Source, Subscription};
use storelet_runtime::{KeyGenerator, Store, StoreError};

use crate::types::Todo;

/// Ephemeral per-item state. Never persisted; discarded on unmount.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemEditState {
    /// Whether the item is currently being edited.
    pub is_editing: bool,
    /// The working copy, `None` until the parent pushes one.
    pub todo: Option<Todo>,
}

fn edit_adapter() -> Result<Adapter<ItemEditState>, AdapterError> {
    Adapter::builder()
        .reducer("set_todo", |state: &ItemEditState, todo: &Todo| {
            ItemEditState {
                is_editing: state.is_editing,
                todo: Some(todo.clone()),
            }
        })
        .reducer("toggle_done", |state: &ItemEditState, checked: &bool| {
            ItemEditState {
                is_editing: state.is_editing,
                todo: state.todo.clone().map(|todo| Todo {
                    done: *checked,
                    ..todo
                }),
            }
        })
        .reducer("edit", |state: &ItemEditState, (): &()| ItemEditState {
            is_editing: true,
            todo: state.todo.clone(),
        })
        .reducer("update_text", |state: &ItemEditState, text: &String| {
            ItemEditState {
                is_editing: false,
                todo: state.todo.clone().map(|todo| Todo {
                    text: text.clone(),
                    ..todo
                }),
            }
        })
        .selector("is_editing", |state: &ItemEditState| state.is_editing)
        .selector("todo", |state: &ItemEditState| state.todo.clone())
        .build()
}

/// Controller for one mounted list item.
pub struct ItemEditor {
    store: Store<ItemEditState>,
    todo_input: Source<Todo>,
    done_toggled: Source<bool>,
    edit_requested: Source<()>,
    text_update: Source<String>,
    destroyed: Source<()>,
    changed: Source<Todo>,
    removed: Source<Todo>,
    _samplers: Vec<Subscription>,
}

impl ItemEditor {
    /// Create the controller with `is_editing == false` and no todo yet;
    /// the parent pushes the item's value via [`ItemEditor::set_todo`] on
    /// mount and on every update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on a malformed adapter or wiring mistake —
    /// construction-time programmer errors only.
    pub fn new(keys: &KeyGenerator) -> Result<Self, StoreError> {
        let todo_input = Source::new("todo-input");
        let done_toggled = Source::new("done-toggled");
        let edit_requested = Source::new("edit-requested");
        let text_update = Source::new("text-update");
        let destroyed = Source::new("destroyed");

        let store = Store::builder(
            keys.key("todo-item"),
            ItemEditState::default(),
            edit_adapter()?,
        )
        .on::<Todo>("set_todo", &todo_input)
        .on::<bool>("toggle_done", &done_toggled)
        .on::<()>("edit", &edit_requested)
        .on::<String>("update_text", &text_update)
        .build()?;

        let changed = Source::new("changed");
        let removed = Source::new("removed");

        // Samplers subscribe after the store bindings above, so they read
        // post-transition state.
        let samplers = vec![
            done_toggled.subscribe(sample_into(&store, &changed)),
            text_update.subscribe(sample_into(&store, &changed)),
            destroyed.subscribe(sample_into(&store, &removed)),
        ];

        Ok(Self {
            store,
            todo_input,
            done_toggled,
            edit_requested,
            text_update,
            destroyed,
            changed,
            removed,
            _samplers: samplers,
        })
    }

    /// Parent pushes the item's current value; replaces the working copy
    /// wholesale, preserving `is_editing`.
    pub fn set_todo(&self, todo: Todo) {
        self.todo_input.emit(todo);
    }

    /// The done checkbox was toggled; `checked` is the checkbox state at
    /// the moment the event fired.
    pub fn toggle_done(&self, checked: bool) {
        self.done_toggled.emit(checked);
    }

    /// Enter edit mode.
    pub fn edit(&self) {
        self.edit_requested.emit(());
    }

    /// Commit the pending edit: leaves edit mode and replaces the todo's
    /// text with the edit field's value.
    pub fn update_text(&self, text: impl Into<String>) {
        self.text_update.emit(text.into());
    }

    /// The item's destroy button was pressed.
    pub fn destroy(&self) {
        self.destroyed.emit(());
    }

    /// Latest working copy, if the parent has pushed one.
    #[must_use]
    pub fn todo(&self) -> Option<Todo> {
        self.store.state().todo
    }

    /// Whether the item is currently being edited.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.store.state().is_editing
    }

    /// Subscribe to the outward intent stream carrying the latest todo
    /// after every done-toggle or text commit.
    pub fn on_changed(&self, callback: impl Fn(&Todo) + Send + Sync + 'static) -> Subscription {
        self.changed.subscribe(callback)
    }

    /// Subscribe to the outward intent stream carrying the latest todo
    /// when the item is destroyed.
    pub fn on_removed(&self, callback: impl Fn(&Todo) + Send + Sync + 'static) -> Subscription {
        self.removed.subscribe(callback)
    }

    /// Subscribe to the `is_editing` stream, recomputed on every
    /// transition. The embedding layer uses the `true` edge to schedule
    /// deferred focus.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only on selector wiring mistakes; with the
    /// built-in adapter this does not fail.
    pub fn on_editing(
        &self,
        callback: impl Fn(&bool) + Send + Sync + 'static,
    ) -> Result<Subscription, StoreError> {
        self.store.on_selector::<bool>("is_editing", callback)
    }

    /// Subscribe to the current-todo stream for rendering, recomputed on
    /// every transition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only on selector wiring mistakes; with the
    /// built-in adapter this does not fail.
    pub fn on_todo(
        &self,
        callback: impl Fn(&Option<Todo>) + Send + Sync + 'static,
    ) -> Result<Subscription, StoreError> {
        self.store.on_selector::<Option<Todo>>("todo", callback)
    }

    /// The underlying per-item store, for state-level subscriptions.
    #[must_use]
    pub const fn store(&self) -> &Store<ItemEditState> {
        &self.store
    }
}

/// A sampler: on any trigger, emit the store's latest todo on `out`.
/// Produces nothing while no todo has been set.
fn sample_into<P>(
    store: &Store<ItemEditState>,
    out: &Source<Todo>,
) -> impl Fn(&P) + Send + Sync + 'static {
    let store = store.clone();
    let out = out.clone();
    move |_trigger: &P| {
        if let Some(todo) = store.state().todo {
            out.emit(todo);
        }
    }
}
