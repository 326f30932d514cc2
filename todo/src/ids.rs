//! Todo id generation.
//!
//! Fresh ids are produced by an [`IdGenerator`] injected into the todos
//! adapter at construction, so tests can use a deterministic generator and
//! production code keeps its randomness out of the reducer definitions.
//! Every generator must return an id not present in the working set it is
//! given.

use crate::types::{Todo, TodoId};
use std::sync::{Mutex, PoisonError};

/// Produces fresh todo ids that do not collide with the given working set.
pub trait IdGenerator: Send + Sync {
    /// Return an id distinct from every id in `existing`.
    fn next_id(&self, existing: &[Todo]) -> TodoId;
}

/// Upper bound of the random id range.
const RANDOM_ID_MAX: u64 = 100_000;

/// Non-cryptographic random ids in `0..=100000`, re-drawn until they miss
/// the working set. Fine for a single-user local list; use
/// [`SequentialIds`] where determinism matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self, existing: &[Todo]) -> TodoId {
        // Range exhausted: fall back to the monotonic scheme.
        if existing.len() as u64 > RANDOM_ID_MAX {
            return next_after_max(existing);
        }

        use rand::Rng;
        let mut rng = rand::thread_rng();
        loop {
            let candidate = TodoId::new(rng.gen_range(0..=RANDOM_ID_MAX));
            if !existing.iter().any(|todo| todo.id == candidate) {
                return candidate;
            }
        }
    }
}

/// Monotonic ids: always greater than anything seen before, never reused
/// even after removals.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: Mutex<u64>,
}

impl SequentialIds {
    /// Create a generator starting at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, existing: &[Todo]) -> TodoId {
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let id = (*next).max(next_after_max(existing).get());
        *next = id.saturating_add(1);
        TodoId::new(id)
    }
}

// Saturates at u64::MAX: a working set already holding the top id has
// exhausted the monotonic range, and handing out MAX again beats a panic on
// otherwise valid restored state.
fn next_after_max(existing: &[Todo]) -> TodoId {
    TodoId::new(
        existing
            .iter()
            .map(|todo| todo.id.get().saturating_add(1))
            .max()
            .unwrap_or(0),
    )
}
