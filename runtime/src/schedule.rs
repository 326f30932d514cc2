//! Deferred-tick scheduling.
//!
//! Some side effects must run strictly *after* the current synchronous
//! notification cycle — the canonical case is moving input focus to an edit
//! field only once the render layer has caught up with `is_editing = true`.
//! A [`Scheduler`] queues such callbacks; the driving loop drains the queue
//! between event deliveries.
//!
//! Deferred callbacks carry no cancellation token. A callback whose target
//! has meanwhile gone away (the item was removed before the tick fired) must
//! be written as a no-op, typically by holding a [`Weak`](std::sync::Weak)
//! reference and giving up when the upgrade fails.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

type Task = Box<dyn FnOnce() + Send>;

/// FIFO queue of callbacks deferred past the current notification cycle.
///
/// Cloning shares the queue, so the scheduler can be handed to every
/// controller that needs to defer work.
///
/// # Example
///
/// ```
/// use storelet_runtime::Scheduler;
///
/// let scheduler = Scheduler::new();
/// scheduler.defer(|| println!("next tick"));
/// assert!(!scheduler.is_idle());
/// assert_eq!(scheduler.run_until_idle(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Arc<Mutex<VecDeque<Task>>>,
}

impl Scheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run on the next drain.
    pub fn defer(&self, task: impl FnOnce() + Send + 'static) {
        self.lock().push_back(Box::new(task));
    }

    /// Whether the queue is currently empty.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run queued tasks in FIFO order until the queue is empty, including
    /// tasks deferred by the tasks themselves. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop under the lock, run outside it so tasks may defer more.
            let task = self.lock().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                },
                None => return ran,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Task>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.lock().len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn runs_tasks_in_fifo_order() {
        let scheduler = Scheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            scheduler.defer(move || order.lock().unwrap().push(tag));
        }

        assert_eq!(scheduler.run_until_idle(), 3);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn tasks_deferred_during_drain_run_in_the_same_drain() {
        let scheduler = Scheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let inner_scheduler = scheduler.clone();
        let inner_order = Arc::clone(&order);
        scheduler.defer(move || {
            inner_order.lock().unwrap().push("outer");
            let chained = Arc::clone(&inner_order);
            inner_scheduler.defer(move || chained.lock().unwrap().push("inner"));
        });

        assert_eq!(scheduler.run_until_idle(), 2);
        assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[test]
    fn stale_weak_reference_is_a_no_op() {
        let scheduler = Scheduler::new();
        let target = Arc::new(Mutex::new(false));
        let weak = Arc::downgrade(&target);
        drop(target);

        scheduler.defer(move || {
            if let Some(target) = weak.upgrade() {
                *target.lock().unwrap() = true;
            }
        });

        // Must not crash on the dead reference.
        assert_eq!(scheduler.run_until_idle(), 1);
    }
}
