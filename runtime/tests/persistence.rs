//! Persistence behavior of the Store: restore on construction, save on
//! every transition, and the fallback path for unreadable persisted state.

#![allow(clippy::unwrap_used)]

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storelet_core::{Adapter, Source};
use storelet_runtime::{KeyGenerator, Storage, Store};
use storelet_testing::MemoryStorage;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CounterState {
    count: i64,
}

fn adapter() -> Adapter<CounterState> {
    Adapter::builder()
        .reducer("add", |state: &CounterState, amount: &i64| CounterState {
            count: state.count + amount,
        })
        .build()
        .unwrap()
}

const STORAGE_KEY: &str = "counter-state";

#[test]
fn prior_persisted_state_overrides_the_default() {
    storelet_testing::init_tracing();
    let storage = Arc::new(MemoryStorage::new());
    storage.seed(STORAGE_KEY, r#"{"count":41}"#);

    let keys = KeyGenerator::new();
    let store = Store::builder(keys.key("counter"), CounterState::default(), adapter())
        .persisted(STORAGE_KEY, storage)
        .build()
        .unwrap();

    assert_eq!(store.state(), CounterState { count: 41 });
}

#[test]
fn unreadable_persisted_state_falls_back_to_the_default() {
    storelet_testing::init_tracing();
    let storage = Arc::new(MemoryStorage::new());
    storage.seed(STORAGE_KEY, "{not json");

    let keys = KeyGenerator::new();
    let store = Store::builder(keys.key("counter"), CounterState::default(), adapter())
        .persisted(STORAGE_KEY, storage)
        .build()
        .unwrap();

    assert_eq!(store.state(), CounterState::default());
}

#[test]
fn every_transition_is_saved() {
    let storage = Arc::new(MemoryStorage::new());
    let keys = KeyGenerator::new();
    let add = Source::new("add");

    let _store = Store::builder(keys.key("counter"), CounterState::default(), adapter())
        .on::<i64>("add", &add)
        .persisted(STORAGE_KEY, Arc::clone(&storage) as Arc<dyn Storage>)
        .build()
        .unwrap();

    add.emit(1);
    assert_eq!(storage.get(STORAGE_KEY).as_deref(), Some(r#"{"count":1}"#));

    add.emit(4);
    assert_eq!(storage.get(STORAGE_KEY).as_deref(), Some(r#"{"count":5}"#));
}

#[test]
fn state_survives_across_store_instances() {
    let storage = Arc::new(MemoryStorage::new());
    let keys = KeyGenerator::new();

    {
        let add = Source::new("add");
        let _store = Store::builder(keys.key("counter"), CounterState::default(), adapter())
            .on::<i64>("add", &add)
            .persisted(STORAGE_KEY, Arc::clone(&storage) as Arc<dyn Storage>)
            .build()
            .unwrap();
        add.emit(7);
    }

    let revived = Store::builder(keys.key("counter"), CounterState::default(), adapter())
        .persisted(STORAGE_KEY, storage)
        .build()
        .unwrap();
    assert_eq!(revived.state(), CounterState { count: 7 });
}

#[test]
fn unpersisted_stores_never_touch_storage() {
    let storage = Arc::new(MemoryStorage::new());
    let keys = KeyGenerator::new();
    let add = Source::new("add");

    let _store = Store::builder(keys.key("counter"), CounterState::default(), adapter())
        .on::<i64>("add", &add)
        .build()
        .unwrap();

    add.emit(1);
    assert!(storage.get(STORAGE_KEY).is_none());
}
