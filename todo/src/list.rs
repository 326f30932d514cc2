//! The list controller: owner of the single root store.
//!
//! [`TodoList`] assembles the joined root adapter (todos slice + filter
//! slice + the `filtered_todos` joined selector), binds one event source per
//! reducer, and persists every transition under a fixed storage key. Its
//! command methods are thin pass-throughs that push a payload into the
//! matching source — they perform no logic themselves.
//!
//! Nothing else writes `TodoState`: per-item controllers only emit intents
//! (`changed`, `removed`) that the embedding layer feeds back into
//! [`TodoList::update`] and [`TodoList::remove`].

use std::sync::Arc;
use storelet_core::{Adapter, AdapterError, Source, Subscription, join};
use storelet_runtime::{KeyGenerator, Storage, Store, StoreError};

use crate::ids::IdGenerator;
use crate::types::{Todo, TodoFilter, TodoState, active_todos, completed_todos, filtered_todos};

/// Fixed storage identifier for the root store's persisted state.
pub const STATE_STORAGE_KEY: &str = "todo-state";

/// The root list controller: the full todo list, the active filter, and the
/// derived views.
pub struct TodoList {
    store: Store<TodoState>,
    create: Source<String>,
    remove: Source<Todo>,
    update: Source<Todo>,
    toggle_all: Source<bool>,
    clear_completed: Source<()>,
    set_filter: Source<TodoFilter>,
}

/// Everything the rendering layer needs, bundled per state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoListVm {
    /// The full root state.
    pub state: TodoState,
    /// The active filter.
    pub filter: TodoFilter,
    /// All todos, in display order.
    pub all: Vec<Todo>,
    /// Todos with `done == false`.
    pub active: Vec<Todo>,
    /// Todos with `done == true`.
    pub completed: Vec<Todo>,
    /// Todos visible under the active filter.
    pub filtered: Vec<Todo>,
}

impl TodoListVm {
    fn from_state(state: TodoState) -> Self {
        Self {
            filter: state.filter,
            all: state.todos.clone(),
            active: active_todos(&state.todos),
            completed: completed_todos(&state.todos),
            filtered: filtered_todos(&state),
            state,
        }
    }
}

fn todos_adapter(ids: Arc<dyn IdGenerator>) -> Result<Adapter<Vec<Todo>>, AdapterError> {
    Adapter::builder()
        .reducer("create", move |todos: &Vec<Todo>, text: &String| {
            let mut next = todos.clone();
            next.push(Todo {
                id: ids.next_id(todos),
                text: text.clone(),
                done: false,
            });
            next
        })
        .reducer("remove", |todos: &Vec<Todo>, target: &Todo| {
            todos
                .iter()
                .filter(|todo| todo.id != target.id)
                .cloned()
                .collect()
        })
        .reducer("update", |todos: &Vec<Todo>, updated: &Todo| {
            todos
                .iter()
                .map(|todo| {
                    if todo.id == updated.id {
                        updated.clone()
                    } else {
                        todo.clone()
                    }
                })
                .collect()
        })
        .reducer("toggle_all", |todos: &Vec<Todo>, done: &bool| {
            todos
                .iter()
                .map(|todo| Todo {
                    done: *done,
                    ..todo.clone()
                })
                .collect()
        })
        .reducer("clear_completed", |todos: &Vec<Todo>, (): &()| {
            todos.iter().filter(|todo| !todo.done).cloned().collect()
        })
        .selector("active", |todos: &Vec<Todo>| active_todos(todos))
        .selector("completed", |todos: &Vec<Todo>| completed_todos(todos))
        .build()
}

fn filter_adapter() -> Result<Adapter<TodoFilter>, AdapterError> {
    Adapter::builder()
        .reducer("set", |_filter: &TodoFilter, next: &TodoFilter| *next)
        .build()
}

fn root_adapter(ids: Arc<dyn IdGenerator>) -> Result<Adapter<TodoState>, AdapterError> {
    join::<TodoState>()
        .slice(
            "todos",
            todos_adapter(ids)?,
            |state| &state.todos,
            |state, todos| TodoState {
                todos,
                filter: state.filter,
            },
        )
        .slice(
            "filter",
            filter_adapter()?,
            |state| &state.filter,
            |state, filter| TodoState {
                todos: state.todos.clone(),
                filter,
            },
        )
        .selector("filtered_todos", filtered_todos)
        .build()
}

impl TodoList {
    /// Build the root store, restoring persisted state from `storage` when
    /// a parseable prior value exists under [`STATE_STORAGE_KEY`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on a malformed adapter or wiring mistake —
    /// construction-time programmer errors only.
    pub fn new(
        keys: &KeyGenerator,
        ids: Arc<dyn IdGenerator>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, StoreError> {
        let create = Source::new("create");
        let remove = Source::new("remove");
        let update = Source::new("update");
        let toggle_all = Source::new("toggle-all");
        let clear_completed = Source::new("clear-completed");
        let set_filter = Source::new("set-filter");

        let store = Store::builder(keys.key("todo"), TodoState::default(), root_adapter(ids)?)
            .on::<String>("todos.create", &create)
            .on::<Todo>("todos.remove", &remove)
            .on::<Todo>("todos.update", &update)
            .on::<bool>("todos.toggle_all", &toggle_all)
            .on::<()>("todos.clear_completed", &clear_completed)
            .on::<TodoFilter>("filter.set", &set_filter)
            .persisted(STATE_STORAGE_KEY, storage)
            .build()?;

        Ok(Self {
            store,
            create,
            remove,
            update,
            toggle_all,
            clear_completed,
            set_filter,
        })
    }

    /// Append a new todo with a fresh id and `done == false`.
    pub fn create(&self, text: impl Into<String>) {
        self.create.emit(text.into());
    }

    /// Drop the entry whose id matches `todo.id`.
    pub fn remove(&self, todo: &Todo) {
        self.remove.emit(todo.clone());
    }

    /// Replace the entry whose id matches, with the full given record.
    pub fn update(&self, todo: &Todo) {
        self.update.emit(todo.clone());
    }

    /// Set `done` on every entry.
    pub fn toggle_all(&self, done: bool) {
        self.toggle_all.emit(done);
    }

    /// Drop all entries with `done == true`.
    pub fn clear_completed(&self) {
        self.clear_completed.emit(());
    }

    /// Switch the active filter.
    pub fn set_filter(&self, filter: TodoFilter) {
        self.set_filter.emit(filter);
    }

    /// Snapshot of the current root state.
    #[must_use]
    pub fn state(&self) -> TodoState {
        self.store.state()
    }

    /// Snapshot view-model bundle for rendering.
    #[must_use]
    pub fn vm(&self) -> TodoListVm {
        TodoListVm::from_state(self.store.state())
    }

    /// Subscribe to a freshly built view model on every transition.
    pub fn on_vm(&self, callback: impl Fn(&TodoListVm) + Send + Sync + 'static) -> Subscription {
        self.store.on_state(move |state: &TodoState| {
            callback(&TodoListVm::from_state(state.clone()));
        })
    }

    /// The underlying root store, for selector-level subscriptions.
    #[must_use]
    pub const fn store(&self) -> &Store<TodoState> {
        &self.store
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use storelet_testing::MemoryStorage;

    fn list() -> TodoList {
        let keys = KeyGenerator::new();
        TodoList::new(
            &keys,
            Arc::new(SequentialIds::new()),
            Arc::new(MemoryStorage::new()),
        )
        .unwrap()
    }

    #[test]
    fn create_appends_with_fresh_id_and_not_done() {
        let list = list();
        list.create("buy milk");
        list.create("write docs");

        let state = list.state();
        assert_eq!(state.todos.len(), 2);
        assert!(state.todos.iter().all(|todo| !todo.done));
        assert_ne!(state.todos[0].id, state.todos[1].id);
        assert_eq!(state.todos[0].text, "buy milk");
        assert_eq!(state.todos[1].text, "write docs");
    }

    #[test]
    fn remove_drops_only_the_matching_id() {
        let list = list();
        list.create("a");
        list.create("b");

        let victim = list.state().todos[0].clone();
        list.remove(&victim);

        let state = list.state();
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.todos[0].text, "b");
    }

    #[test]
    fn update_replaces_the_whole_record() {
        let list = list();
        list.create("a");

        let mut todo = list.state().todos[0].clone();
        todo.text = "edited".into();
        todo.done = true;
        list.update(&todo);

        assert_eq!(list.state().todos, vec![todo]);
    }

    #[test]
    fn toggle_all_flips_every_entry() {
        let list = list();
        list.create("a");
        list.create("b");

        list.toggle_all(true);
        let vm = list.vm();
        assert!(vm.active.is_empty());
        assert_eq!(vm.completed.len(), 2);

        list.toggle_all(false);
        let vm = list.vm();
        assert_eq!(vm.active.len(), 2);
        assert!(vm.completed.is_empty());
    }

    #[test]
    fn clear_completed_leaves_active_untouched() {
        let list = list();
        list.create("keep");
        list.create("drop");

        let mut done = list.state().todos[1].clone();
        done.done = true;
        list.update(&done);

        let active_before = list.vm().active;
        list.clear_completed();

        let vm = list.vm();
        assert!(vm.completed.is_empty());
        assert_eq!(vm.active, active_before);
    }

    #[test]
    fn filtered_view_follows_the_filter() {
        let list = list();
        list.create("open");
        list.create("closed");
        let mut done = list.state().todos[1].clone();
        done.done = true;
        list.update(&done);

        list.set_filter(TodoFilter::Active);
        assert_eq!(list.vm().filtered.len(), 1);
        assert_eq!(list.vm().filtered[0].text, "open");

        list.set_filter(TodoFilter::Completed);
        assert_eq!(list.vm().filtered.len(), 1);
        assert_eq!(list.vm().filtered[0].text, "closed");

        list.set_filter(TodoFilter::All);
        assert_eq!(list.vm().filtered, list.state().todos);
    }

    #[test]
    fn vm_stream_fires_per_transition() {
        let list = list();
        let recorder = storelet_testing::Recorder::new();
        let sink = recorder.sink();
        let _sub = list.on_vm(move |vm| sink(vm));

        list.create("a");
        list.toggle_all(true);

        assert_eq!(recorder.len(), 2);
        let last = recorder.last().unwrap();
        assert_eq!(last.completed.len(), 1);
        assert!(last.active.is_empty());
    }

    #[test]
    fn commands_pass_through_without_extra_logic() {
        // Selector-level subscription on the root store sees the same
        // values the vm derives.
        let list = list();
        let recorder = storelet_testing::Recorder::new();
        let sink = recorder.sink();
        let _sub = list
            .store()
            .on_selector::<Vec<Todo>>("filtered_todos", move |todos| sink(todos))
            .unwrap();

        list.create("a");
        assert_eq!(recorder.last().unwrap().len(), 1);
    }
}
