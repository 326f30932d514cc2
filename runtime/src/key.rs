//! Store instance keys.
//!
//! Every store instance needs a globally unique key so that multiple
//! instances of the same adapter (one per mounted list item, say) never
//! collide. Keys come from an explicit [`KeyGenerator`] injected at
//! construction — there is no hidden global counter, and tests can hold
//! their own generator for deterministic keys.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identity of one store instance: a human-readable name plus a
/// process-unique numeric suffix.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreKey {
    name: String,
    id: u64,
}

impl StoreKey {
    /// The human-readable part of the key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unique numeric suffix.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.id)
    }
}

/// Generator of unique [`StoreKey`]s, scoped to wherever it is shared.
///
/// One generator per process is the usual arrangement; every key it hands
/// out carries a fresh suffix regardless of name.
#[derive(Debug, Default)]
pub struct KeyGenerator {
    next: AtomicU64,
}

impl KeyGenerator {
    /// Create a generator starting at suffix `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Produce a key with the given name and a fresh unique suffix.
    pub fn key(&self, name: impl Into<String>) -> StoreKey {
        StoreKey {
            name: name.into(),
            id: self.next.fetch_add(1, Ordering::Relaxed),
        }
    }
}
