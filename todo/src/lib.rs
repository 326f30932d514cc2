//! A TodoMVC built on storelet's sources, adapters and observable stores.
//!
//! The application is two controllers:
//!
//! - [`TodoList`] owns the single root store (the full list plus the active
//!   filter), built from a joined adapter and persisted on every transition.
//! - [`ItemEditor`] is an ephemeral per-item controller: it tracks edit mode
//!   and emits `changed`/`removed` intents the embedding layer feeds back
//!   into the list. It never writes the root state itself.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use storelet_runtime::{FileStorage, KeyGenerator};
//! use todo::{RandomIds, TodoFilter, TodoList};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = KeyGenerator::new();
//! let storage = Arc::new(FileStorage::new(".todo-mvc"));
//! let list = TodoList::new(&keys, Arc::new(RandomIds), storage)?;
//!
//! list.create("Buy milk");
//! list.toggle_all(true);
//! list.set_filter(TodoFilter::Completed);
//!
//! for todo in list.vm().filtered {
//!     println!("[x] {}", todo.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod ids;
pub mod item;
pub mod list;
pub mod types;

// Re-export commonly used types
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use item::{ItemEditState, ItemEditor};
pub use list::{STATE_STORAGE_KEY, TodoList, TodoListVm};
pub use types::{Todo, TodoFilter, TodoId, TodoState};
