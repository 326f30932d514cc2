//! # Storelet Testing
//!
//! Testing utilities and helpers for the storelet state-adapter
//! architecture.
//!
//! - [`Recorder`]: collects stream emissions for assertion
//! - [`MemoryStorage`]: in-memory [`Storage`] double, seedable with prior
//!   (or deliberately corrupt) persisted state
//! - [`init_tracing`]: opt-in tracing output for tests via `RUST_LOG`
//!
//! ## Example
//!
//! ```
//! use storelet_core::Source;
//! use storelet_testing::Recorder;
//!
//! let numbers = Source::new("numbers");
//! let recorder = Recorder::new();
//! let _sub = numbers.subscribe(recorder.sink());
//!
//! numbers.emit(1);
//! numbers.emit(2);
//! assert_eq!(recorder.values(), vec![1, 2]);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use storelet_runtime::{Storage, StorageError};

/// Collects every value delivered to [`Recorder::sink`] for later
/// inspection.
pub struct Recorder<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
        }
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records each value it receives; pass it to
    /// `Source::subscribe` or a store's `on_*` methods.
    pub fn sink(&self) -> impl Fn(&T) + Send + Sync + 'static {
        let values = Arc::clone(&self.values);
        move |value: &T| {
            values
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(value.clone());
        }
    }

    /// All recorded values, in delivery order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.lock().clone()
    }

    /// The most recently recorded value, if any.
    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.lock().last().cloned()
    }

    /// Number of recorded values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory [`Storage`] implementation for tests. Never fails.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an entry, e.g. with a previously persisted state or a
    /// deliberately corrupt value.
    pub fn seed(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Read back what was saved under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.seed(key, value);
        Ok(())
    }
}

/// Initialize tracing output for a test binary, honoring `RUST_LOG`.
/// Safe to call from every test; only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn recorder_collects_in_order() {
        let recorder = Recorder::new();
        let sink = recorder.sink();
        sink(&1);
        sink(&2);
        sink(&3);

        assert_eq!(recorder.values(), vec![1, 2, 3]);
        assert_eq!(recorder.last(), Some(3));
        assert_eq!(recorder.len(), 3);

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryStorage::new();
        assert!(storage.load("k").unwrap().is_none());

        storage.save("k", "v").unwrap();
        assert_eq!(storage.load("k").unwrap().as_deref(), Some("v"));

        storage.seed("k", "w");
        assert_eq!(storage.get("k").as_deref(), Some("w"));
    }
}
