//! End-to-end scenarios across the list controller, the per-item
//! controllers and persistence.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use storelet_runtime::{KeyGenerator, Scheduler, Storage};
use storelet_testing::{MemoryStorage, Recorder};
use todo::{
    ItemEditor, STATE_STORAGE_KEY, SequentialIds, Todo, TodoFilter, TodoId, TodoList, TodoState,
};

fn list_with(storage: Arc<MemoryStorage>) -> TodoList {
    let keys = KeyGenerator::new();
    TodoList::new(&keys, Arc::new(SequentialIds::new()), storage).unwrap()
}

fn list() -> TodoList {
    list_with(Arc::new(MemoryStorage::new()))
}

#[test]
fn full_list_walkthrough() {
    let list = list();

    list.create("buy milk");
    assert_eq!(list.state().todos.len(), 1);
    assert!(!list.state().todos[0].done);

    list.toggle_all(true);
    list.set_filter(TodoFilter::Active);
    assert!(list.vm().filtered.is_empty());
    list.set_filter(TodoFilter::Completed);
    assert_eq!(list.vm().filtered.len(), 1);

    list.clear_completed();
    list.set_filter(TodoFilter::All);
    assert!(list.state().todos.is_empty());
}

#[test]
fn item_edit_scenario() {
    let keys = KeyGenerator::new();
    let editor = ItemEditor::new(&keys).unwrap();
    editor.set_todo(Todo {
        id: TodoId::new(1),
        text: "a".into(),
        done: false,
    });

    let changes = Recorder::new();
    let sink = changes.sink();
    let _sub = editor.on_changed(move |todo| sink(todo));

    editor.edit();
    assert!(editor.is_editing());

    editor.update_text("b");
    assert!(!editor.is_editing());
    assert_eq!(
        changes.values(),
        vec![Todo {
            id: TodoId::new(1),
            text: "b".into(),
            done: false,
        }]
    );
}

#[test]
fn editor_intents_flow_back_into_the_list() {
    let list = Arc::new(list());
    list.create("draft");
    let keys = KeyGenerator::new();

    let editor = ItemEditor::new(&keys).unwrap();
    editor.set_todo(list.state().todos[0].clone());

    let _on_changed = editor.on_changed({
        let list = Arc::clone(&list);
        move |todo| list.update(todo)
    });
    let _on_removed = editor.on_removed({
        let list = Arc::clone(&list);
        move |todo| list.remove(todo)
    });

    editor.update_text("final");
    assert_eq!(list.state().todos[0].text, "final");

    editor.toggle_done(true);
    assert!(list.state().todos[0].done);

    editor.destroy();
    assert!(list.state().todos.is_empty());
}

#[test]
fn state_restores_across_instances_through_shared_storage() {
    let storage = Arc::new(MemoryStorage::new());

    {
        let list = list_with(Arc::clone(&storage));
        list.create("persisted");
        list.set_filter(TodoFilter::Active);
    }

    let restored = list_with(Arc::clone(&storage));
    let state = restored.state();
    assert_eq!(state.todos.len(), 1);
    assert_eq!(state.todos[0].text, "persisted");
    assert_eq!(state.filter, TodoFilter::Active);
}

#[test]
fn corrupt_persisted_state_falls_back_to_empty() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .save(STATE_STORAGE_KEY, "{not json at all")
        .unwrap();

    let list = list_with(Arc::clone(&storage));
    assert_eq!(list.state(), TodoState::default());
}

#[test]
fn deferred_focus_tolerates_a_vanished_target() {
    let keys = KeyGenerator::new();
    let editor = ItemEditor::new(&keys).unwrap();
    editor.set_todo(Todo {
        id: TodoId::new(1),
        text: "a".into(),
        done: false,
    });

    let scheduler = Scheduler::new();
    let target = Arc::new(());
    let weak = Arc::downgrade(&target);
    let focused = Arc::new(AtomicBool::new(false));
    let _sub = editor
        .on_editing({
            let scheduler = scheduler.clone();
            let focused = Arc::clone(&focused);
            move |editing| {
                if *editing {
                    let weak = Weak::clone(&weak);
                    let focused = Arc::clone(&focused);
                    scheduler.defer(move || {
                        if weak.upgrade().is_some() {
                            focused.store(true, Ordering::SeqCst);
                        }
                    });
                }
            }
        })
        .unwrap();

    editor.edit();
    // The target unmounts before the deferred tick runs.
    drop(target);
    scheduler.run_until_idle();

    assert!(!focused.load(Ordering::SeqCst));
}

#[test]
fn create_survives_a_restored_state_holding_the_top_id() {
    let storage = Arc::new(MemoryStorage::new());
    storage.seed(
        STATE_STORAGE_KEY,
        format!(
            r#"{{"todos":[{{"id":{},"text":"old","done":false}}],"filter":"all"}}"#,
            u64::MAX
        ),
    );

    let list = list_with(Arc::clone(&storage));
    assert_eq!(list.state().todos.len(), 1);

    // The monotonic range is exhausted; creation must still not panic.
    list.create("new");
    assert_eq!(list.state().todos.len(), 2);
}

#[test]
fn created_ids_stay_unique_after_heavy_churn() {
    let list = list();
    for i in 0..50 {
        list.create(format!("todo {i}"));
    }
    for _ in 0..20 {
        let victim = list.state().todos[0].clone();
        list.remove(&victim);
        list.create("replacement");
    }

    let todos = list.state().todos;
    let mut ids: Vec<TodoId> = todos.iter().map(|todo| todo.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), todos.len());
}

fn todo_strategy() -> impl Strategy<Value = Todo> {
    (any::<u64>(), ".{0,20}", any::<bool>()).prop_map(|(id, text, done)| Todo {
        id: TodoId::new(id),
        text,
        done,
    })
}

fn state_strategy() -> impl Strategy<Value = TodoState> {
    (
        proptest::collection::vec(todo_strategy(), 0..8),
        prop_oneof![
            Just(TodoFilter::All),
            Just(TodoFilter::Active),
            Just(TodoFilter::Completed),
        ],
    )
        .prop_map(|(todos, filter)| TodoState { todos, filter })
}

proptest! {
    #[test]
    fn persisted_layout_round_trips(state in state_strategy()) {
        let json = serde_json::to_string(&state).unwrap();
        let back: TodoState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, state);
    }

    #[test]
    fn every_create_yields_a_fresh_id(texts in proptest::collection::vec(".{0,10}", 1..20)) {
        let list = list();
        for text in &texts {
            list.create(text.clone());
        }
        let todos = list.state().todos;
        let mut ids: Vec<TodoId> = todos.iter().map(|todo| todo.id).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), texts.len());
    }
}
