//! # Storelet Core
//!
//! Core primitives for the storelet state-adapter architecture.
//!
//! This crate provides the pure, runtime-free building blocks for describing
//! reactive state: event sources that carry discrete payloads, adapters that
//! declare named state transitions and derived reads, and a joiner that
//! composes adapters over a composite state shape.
//!
//! ## Core Concepts
//!
//! - **Source**: a named, multicast channel of discrete payloads
//! - **Adapter**: pure data describing reducers `(state, payload) → state`
//!   and selectors `(state) → value` for one state slice
//! - **Joiner**: lifts several adapters into one adapter over a composite
//!   state, optionally adding cross-field selectors
//!
//! Adapters carry no subscriptions and no current state. The same adapter
//! definition can back any number of independent store instances; the live
//! engine lives in `storelet-runtime`.
//!
//! ## Example
//!
//! ```
//! use storelet_core::Adapter;
//!
//! let counter = Adapter::<i64>::builder()
//!     .reducer("add", |count, amount: &i64| count + amount)
//!     .reducer("reset", |_count, (): &()| 0)
//!     .selector("doubled", |count| count * 2)
//!     .build()?;
//!
//! let next = counter.reduce("add", &1, &41i64)?;
//! assert_eq!(next, 42);
//! assert_eq!(counter.select::<i64>("doubled", &next)?, 84);
//! # Ok::<(), storelet_core::AdapterError>(())
//! ```

pub mod adapter;
pub mod join;
pub mod source;

pub use adapter::{Adapter, AdapterBuilder, AdapterError};
pub use join::{Joiner, join};
pub use source::{Source, Subscription};
