//! CLI walkthrough of the todo application.
//!
//! Runs the list controller end to end (create, toggle, filter, clear),
//! then mounts a per-item editor and shows its intents flowing back into
//! the list, including the deferred-focus handoff after entering edit mode.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use storelet_runtime::{FileStorage, KeyGenerator, Scheduler};
use todo::{ItemEditor, RandomIds, TodoFilter, TodoList};
use tracing_subscriber::EnvFilter;

fn print_list(list: &TodoList) {
    let vm = list.vm();
    println!("  filter: {} ({} shown)", vm.filter, vm.filtered.len());
    for todo in &vm.filtered {
        let status = if todo.done { "x" } else { " " };
        println!("  [{status}] {} {}", todo.id, todo.text);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Todo walkthrough ===\n");

    let keys = KeyGenerator::new();
    let storage = Arc::new(FileStorage::new(".todo-mvc"));
    let list = Arc::new(TodoList::new(&keys, Arc::new(RandomIds), storage)?);

    println!("Creating todos...");
    list.create("Buy milk");
    list.create("Write documentation");
    list.create("Water the plants");
    print_list(&list);

    println!("\nCompleting everything, then viewing by filter...");
    list.toggle_all(true);
    list.set_filter(TodoFilter::Active);
    print_list(&list);
    list.set_filter(TodoFilter::Completed);
    print_list(&list);

    println!("\nClearing completed...");
    list.clear_completed();
    list.set_filter(TodoFilter::All);
    print_list(&list);

    println!("\nMounting a per-item editor...");
    list.create("Review the release notes");
    let current = list
        .state()
        .todos
        .first()
        .cloned()
        .ok_or("expected a todo")?;

    let editor = ItemEditor::new(&keys)?;
    editor.set_todo(current);

    // The embedding layer feeds the editor's intents back into the list.
    let _on_changed = editor.on_changed({
        let list = Arc::clone(&list);
        move |todo| list.update(todo)
    });
    let _on_removed = editor.on_removed({
        let list = Arc::clone(&list);
        move |todo| list.remove(todo)
    });

    // Deferred focus: the editor flags edit mode now, the view focuses its
    // input one tick later, tolerating the input being gone by then.
    let scheduler = Scheduler::new();
    let edit_input = Arc::new(EditInput::default());
    let _on_editing = editor.on_editing({
        let scheduler = scheduler.clone();
        let input = Arc::downgrade(&edit_input);
        move |editing| {
            if *editing {
                let input = Weak::clone(&input);
                scheduler.defer(move || {
                    if let Some(input) = input.upgrade() {
                        input.focus();
                    }
                });
            }
        }
    })?;

    println!("\nEditing through the item controller...");
    editor.edit();
    editor.update_text("Review and publish the release notes");
    editor.toggle_done(true);
    scheduler.run_until_idle();
    print_list(&list);

    println!("\nDestroying the item...");
    editor.destroy();
    print_list(&list);

    println!("\nDone. State persisted under .todo-mvc/");
    Ok(())
}

/// Stand-in for the view's edit input field.
#[derive(Default)]
struct EditInput {
    focused: Mutex<bool>,
}

impl EditInput {
    fn focus(&self) {
        *self.focused.lock().unwrap_or_else(PoisonError::into_inner) = true;
        println!("  edit input focused");
    }
}
