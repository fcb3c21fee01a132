//! Recipe protocol scenarios: commit atomicity, silent no-ops on
//! precondition failure, deferred finish batching, and completion
//! monotonicity.

mod common;

use charkit_runtime::component::init::{CharacterInitStateComponent, InitStateComponentConfig};
use charkit_runtime::recipe::RecipeRegistry;
use charkit_runtime::{CharacterAssemblyConfig, InitStateFeature};
use charkit_shared::handle::PendingRecipeHandle;
use charkit_shared::lifecycle::{InitState, RecipeApplicationState};
use charkit_shared::policy::NetExecutionPolicy;
use charkit_shared::role::NetContext;
use common::*;
use std::sync::{Arc, Mutex};

fn recording_registry(log: &EventLog) -> Arc<RecipeRegistry> {
    let mut registry = RecipeRegistry::new();
    for name in ["R1", "R2", "R3"] {
        registry.register(
            name,
            Arc::new(RecordingRecipe {
                name: name.to_string(),
                log: log.clone(),
            }),
        );
    }
    Arc::new(registry)
}

#[test]
fn commit_converts_pending_recipes_in_add_order() {
    let log = new_event_log();
    let registry = recording_registry(&log);
    let empty_data = character_data("Characters/Empty", vec![], vec![]);
    let catalog = catalog_with(&[empty_data.clone()]);

    let (mut server, _handle) = assembly(
        NetContext::dedicated_server(),
        &registry,
        &catalog,
        CharacterAssemblyConfig::default(),
    );
    server.begin_play();
    server.set_character_data(empty_data);

    let h1 = server.add_pending_recipe(registry.resolve("R1").unwrap());
    let h2 = server.add_pending_recipe(registry.resolve("R2").unwrap());
    assert!(h1.is_valid() && h2.is_valid() && h1 != h2);
    assert_eq!(server.init_state_component().pending_recipe_count(), 2);

    assert!(server.commit_pending_recipes());

    let active = server.init_state_component().active_recipes();
    let names: Vec<&str> = active.iter().map(|entry| entry.class_name.as_str()).collect();
    assert_eq!(names, vec!["R1", "R2"]);
    assert_eq!(server.init_state_component().pending_recipe_count(), 0);
    assert_eq!(log_entries(&log), vec!["setup:R1", "setup:R2"]);

    // Finishes are staged: Committed until the deferred fold runs
    assert_eq!(
        server.init_state_component().application_state(),
        RecipeApplicationState::Committed
    );

    // The commit forces a replication notification
    let bundle = server.take_replication().expect("commit must replicate");
    assert_eq!(bundle.recipes.unwrap().entries.len(), 2);

    server.tick();
    assert_eq!(
        server.init_state_component().application_state(),
        RecipeApplicationState::Complete
    );
    assert_eq!(
        server.init_state_component().init_state(),
        InitState::GameplayReady
    );
}

#[test]
fn pending_mutations_after_commit_are_silent_noops() {
    let log = new_event_log();
    let registry = recording_registry(&log);
    let catalog = catalog_with(&[]);

    let (mut server, _handle) = assembly(
        NetContext::dedicated_server(),
        &registry,
        &catalog,
        CharacterAssemblyConfig::default(),
    );
    server.begin_play();

    let h1 = server.add_pending_recipe(registry.resolve("R1").unwrap());
    assert!(server.commit_pending_recipes());

    let active_before = server.init_state_component().active_recipes();
    let state_before = server.init_state_component().application_state();

    // Remove after commit: pending stays empty, active entries untouched
    server.remove_pending_recipe(h1);
    server.remove_multiple_pending_recipes(&[h1]);
    server.clear_pending_recipes();
    let late = server.add_pending_recipe(registry.resolve("R2").unwrap());
    let late_many = server.add_multiple_pending_recipes(vec![
        registry.resolve("R2").unwrap(),
        registry.resolve("R3").unwrap(),
    ]);
    assert!(!server.commit_pending_recipes());

    assert_eq!(late, PendingRecipeHandle::default());
    assert!(late_many.is_empty());
    assert_eq!(server.init_state_component().pending_recipe_count(), 0);
    assert_eq!(server.init_state_component().active_recipes(), active_before);
    assert_eq!(server.init_state_component().application_state(), state_before);
}

#[test]
fn pending_mutations_without_authority_are_silent_noops() {
    let log = new_event_log();
    let registry = recording_registry(&log);
    let catalog = catalog_with(&[]);

    let (mut client, _handle) = assembly(
        NetContext::remote_client(),
        &registry,
        &catalog,
        CharacterAssemblyConfig::default(),
    );
    client.begin_play();

    let handle = client.add_pending_recipe(registry.resolve("R1").unwrap());
    assert!(!handle.is_valid());
    assert_eq!(client.init_state_component().pending_recipe_count(), 0);
    assert!(!client.commit_pending_recipes());
    assert_eq!(
        client.init_state_component().application_state(),
        RecipeApplicationState::PreCommit
    );
    assert!(log_entries(&log).is_empty());
}

#[test]
fn removed_pending_recipes_are_not_committed() {
    let log = new_event_log();
    let registry = recording_registry(&log);
    let catalog = catalog_with(&[]);

    let (mut server, _handle) = assembly(
        NetContext::dedicated_server(),
        &registry,
        &catalog,
        CharacterAssemblyConfig::default(),
    );
    server.begin_play();

    server.add_pending_recipe(registry.resolve("R1").unwrap());
    let h2 = server.add_pending_recipe(registry.resolve("R2").unwrap());
    server.add_pending_recipe(registry.resolve("R3").unwrap());
    server.remove_pending_recipe(h2);

    server.commit_pending_recipes();

    let names: Vec<String> = server
        .init_state_component()
        .active_recipes()
        .iter()
        .map(|entry| entry.class_name.clone())
        .collect();
    assert_eq!(names, vec!["R1", "R3"]);
}

#[test]
fn remove_multiple_drops_every_named_handle() {
    let log = new_event_log();
    let registry = recording_registry(&log);
    let catalog = catalog_with(&[]);

    let (mut server, _handle) = assembly(
        NetContext::dedicated_server(),
        &registry,
        &catalog,
        CharacterAssemblyConfig::default(),
    );
    server.begin_play();

    let handles = server.add_multiple_pending_recipes(vec![
        registry.resolve("R1").unwrap(),
        registry.resolve("R2").unwrap(),
        registry.resolve("R3").unwrap(),
    ]);
    server.remove_multiple_pending_recipes(&handles[..2]);

    assert_eq!(server.init_state_component().pending_recipe_count(), 1);

    server.commit_pending_recipes();

    let names: Vec<String> = server
        .init_state_component()
        .active_recipes()
        .iter()
        .map(|entry| entry.class_name.clone())
        .collect();
    assert_eq!(names, vec!["R3"]);
}

#[test]
fn recipe_sets_stage_in_set_order() {
    let log = new_event_log();
    let registry = recording_registry(&log);
    let catalog = catalog_with(&[]);

    let set = charkit_runtime::RecipeSet::new(
        "Sets/Basics",
        vec![
            registry.resolve("R2").unwrap(),
            registry.resolve("R1").unwrap(),
        ],
    );

    let (mut server, _handle) = assembly(
        NetContext::dedicated_server(),
        &registry,
        &catalog,
        CharacterAssemblyConfig::default(),
    );
    server.begin_play();

    let handles = server.add_recipe_set(&set);
    assert_eq!(handles.len(), 2);
    assert!(handles.iter().all(|handle| handle.is_valid()));

    server.commit_pending_recipes();

    let names: Vec<String> = server
        .init_state_component()
        .active_recipes()
        .iter()
        .map(|entry| entry.class_name.clone())
        .collect();
    assert_eq!(names, vec!["R2", "R1"]);
    assert_eq!(log_entries(&log), vec!["setup:R2", "setup:R1"]);
}

#[test]
fn default_recipes_auto_commit_at_spawn() {
    let log = new_event_log();
    let registry = recording_registry(&log);
    let catalog = catalog_with(&[]);

    let (mut server, _handle) = assembly(
        NetContext::dedicated_server(),
        &registry,
        &catalog,
        CharacterAssemblyConfig {
            default_recipes: vec![
                registry.resolve("R1").unwrap(),
                registry.resolve("R2").unwrap(),
            ],
            auto_commit_recipes: true,
        },
    );

    server.begin_play();

    assert_eq!(log_entries(&log), vec!["setup:R1", "setup:R2"]);
    assert_eq!(
        server.init_state_component().application_state(),
        RecipeApplicationState::Committed
    );

    server.tick();
    assert_eq!(
        server.init_state_component().application_state(),
        RecipeApplicationState::Complete
    );
}

#[test]
fn same_tick_finishes_fold_into_one_deferred_check() {
    let log = new_event_log();
    let started = Arc::new(Mutex::new(Vec::new()));

    let mut registry = RecipeRegistry::new();
    registry.register(
        "AsyncA",
        Arc::new(AsyncRecipe {
            name: "AsyncA".to_string(),
            policy: NetExecutionPolicy::Both,
            log: log.clone(),
            started_handles: started.clone(),
        }),
    );
    registry.register(
        "AsyncB",
        Arc::new(AsyncRecipe {
            name: "AsyncB".to_string(),
            policy: NetExecutionPolicy::Both,
            log: log.clone(),
            started_handles: started.clone(),
        }),
    );

    let net = NetContext::dedicated_server();
    let (mut pawn, _handle) = TestPawn::possessed(net);
    let mut component = CharacterInitStateComponent::new(InitStateComponentConfig::default());

    component.add_pending_recipe(registry.resolve("AsyncA").unwrap(), &net);
    component.add_pending_recipe(registry.resolve("AsyncB").unwrap(), &net);
    assert!(component.commit_pending_recipes(&mut pawn));

    let handles = started.lock().unwrap().clone();
    assert_eq!(handles.len(), 2);
    assert_eq!(
        component.application_state(),
        RecipeApplicationState::Committed
    );

    // Both recipes finish within the same tick
    component.handle_recipe_setup_finished(handles[0]);
    component.handle_recipe_setup_finished(handles[1]);

    // Exactly one deferred fold runs for the whole batch
    assert!(component.tick());
    assert!(!component.tick());

    assert!(component
        .active_recipes()
        .iter()
        .all(|entry| entry.finished));
    assert_eq!(
        component.application_state(),
        RecipeApplicationState::Complete
    );
}

#[test]
fn completion_is_monotonic_for_async_recipes() {
    let log = new_event_log();
    let started = Arc::new(Mutex::new(Vec::new()));

    let mut registry = RecipeRegistry::new();
    registry.register(
        "Async",
        Arc::new(AsyncRecipe {
            name: "Async".to_string(),
            policy: NetExecutionPolicy::Both,
            log: log.clone(),
            started_handles: started.clone(),
        }),
    );
    let registry = Arc::new(registry);
    let empty_data = character_data("Characters/Empty", vec![], vec![]);
    let catalog = catalog_with(&[empty_data.clone()]);

    let (mut server, _handle) = assembly(
        NetContext::dedicated_server(),
        &registry,
        &catalog,
        CharacterAssemblyConfig::default(),
    );
    server.begin_play();
    server.set_character_data(empty_data);

    server.add_pending_recipe(registry.resolve("Async").unwrap());
    server.commit_pending_recipes();

    // An unfinished recipe holds the whole character at Spawned
    server.tick();
    assert_eq!(
        server.init_state_component().application_state(),
        RecipeApplicationState::Committed
    );
    assert_eq!(server.init_state_component().init_state(), InitState::Spawned);

    let handle = started.lock().unwrap()[0];
    server.notify_recipe_finished(handle);
    server.tick();

    assert_eq!(
        server.init_state_component().application_state(),
        RecipeApplicationState::Complete
    );
    assert_eq!(
        server.init_state_component().init_state(),
        InitState::GameplayReady
    );

    // Further ticks keep the terminal states
    server.tick();
    assert_eq!(
        server.init_state_component().application_state(),
        RecipeApplicationState::Complete
    );
}
