//! # Storelet Runtime
//!
//! Runtime engine for the storelet state-adapter architecture.
//!
//! This crate turns the pure descriptions from `storelet-core` into live,
//! observable state: a [`Store`] binds event sources to an adapter's
//! reducers, applies each transition synchronously, and broadcasts the new
//! state plus every recomputed selector value to its subscribers.
//!
//! ## Core Components
//!
//! - **[`Store`]**: the engine holding current state for one adapter instance
//! - **[`Storage`]**: the injected durable key-value port used to persist a
//!   root store's state across runs
//! - **[`Scheduler`]**: a FIFO queue of deferred callbacks for side effects
//!   that must run strictly after the current notification cycle
//! - **[`KeyGenerator`]**: explicit per-process generator of unique store
//!   instance keys
//!
//! ## Concurrency model
//!
//! Everything is synchronous and single-writer: a reducer runs to completion
//! and all subscribers are notified before the next event is processed.
//! There is no polling, no timeouts and no retry anywhere in this runtime.
//!
//! ## Example
//!
//! ```
//! use storelet_core::{Adapter, Source};
//! use storelet_runtime::{KeyGenerator, Store};
//!
//! let adapter = Adapter::<i64>::builder()
//!     .reducer("add", |count, amount: &i64| count + amount)
//!     .selector("doubled", |count| count * 2)
//!     .build()?;
//!
//! let keys = KeyGenerator::new();
//! let add = Source::new("add");
//! let store = Store::builder(keys.key("counter"), 0, adapter)
//!     .on::<i64>("add", &add)
//!     .build()?;
//!
//! add.emit(21);
//! assert_eq!(store.state(), 21);
//! assert_eq!(store.selector::<i64>("doubled")?, 42);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod key;
pub mod persist;
pub mod schedule;
pub mod store;

pub use error::StoreError;
pub use key::{KeyGenerator, StoreKey};
pub use persist::{FileStorage, Storage, StorageError};
pub use schedule::Scheduler;
pub use store::{Store, StoreBuilder};
