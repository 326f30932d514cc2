//! Domain types for the todo application.
//!
//! [`TodoState`] is the root state owned exclusively by the list controller;
//! everything derived from it (active, completed, filtered views) is
//! recomputed on read by the pure functions at the bottom of this module,
//! which also back the adapter selectors.
//!
//! The serde layout of [`TodoState`] is the persisted state layout:
//! `{"todos":[{"id":1,"text":"...","done":false}],"filter":"all"}`. It must
//! round-trip exactly for every valid state.

use serde::{Deserialize, Serialize};

/// Unique identifier for a todo item. Assigned at creation, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item. Immutable once constructed; updates replace the
/// whole record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier.
    pub id: TodoId,
    /// The todo's text.
    pub text: String,
    /// Whether the todo is done.
    pub done: bool,
}

/// Which todos the list view shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    /// Show every todo.
    #[default]
    All,
    /// Show only todos with `done == false`.
    Active,
    /// Show only todos with `done == true`.
    Completed,
}

impl std::fmt::Display for TodoFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Root application state: the full list (insertion order = display order)
/// plus the single global filter.
///
/// Invariant: every `id` in `todos` is unique within the sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    /// All todos, in display order.
    pub todos: Vec<Todo>,
    /// The active filter.
    pub filter: TodoFilter,
}

/// Todos with `done == false`, in order.
#[must_use]
pub fn active_todos(todos: &[Todo]) -> Vec<Todo> {
    todos.iter().filter(|todo| !todo.done).cloned().collect()
}

/// Todos with `done == true`, in order.
#[must_use]
pub fn completed_todos(todos: &[Todo]) -> Vec<Todo> {
    todos.iter().filter(|todo| todo.done).cloned().collect()
}

/// The todos visible under the current filter, in order. `All` is the
/// identity.
#[must_use]
pub fn filtered_todos(state: &TodoState) -> Vec<Todo> {
    match state.filter {
        TodoFilter::All => state.todos.clone(),
        TodoFilter::Active => active_todos(&state.todos),
        TodoFilter::Completed => completed_todos(&state.todos),
    }
}
