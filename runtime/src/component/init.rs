//! # Character Init-State Component
//!
//! Specializes the init-state machine with the recipe protocol. Default
//! recipes are staged when the component reaches Spawned, optionally
//! auto-committed, and the character's DataAvailable transition is gated
//! on every committed recipe finishing its setup.
//!
//! Every pending-mutation operation fails silently (no state change,
//! benign return) without authority or after commit: callers are expected
//! to be game-feature activation logic that may race with commit, and a
//! hard failure would be disproportionate.

use crate::initstate::{InitStateFeature, InitStateManager};
use crate::pawn::PawnActor;
use crate::recipe::active::ActiveRecipeContainer;
use crate::recipe::{RecipeClass, RecipeRegistry};
use crate::replication::{RecipeContainerSnapshot, ReplicationKey};
use charkit_shared::handle::{ActiveRecipeHandle, PendingRecipeHandle};
use charkit_shared::lifecycle::{InitState, RecipeApplicationState};
use charkit_shared::role::NetContext;
use log::debug;
use std::cell::Cell;

/// Feature name this component registers under
pub const INIT_STATE_FEATURE_NAME: &str = "CharacterInitState";

/// Construction-time configuration of the init-state component
#[derive(Clone, Default)]
pub struct InitStateComponentConfig {
    /// Recipe classes staged automatically when the component spawns
    pub default_recipes: Vec<RecipeClass>,

    /// Whether to commit the staged recipes at spawn without external
    /// intervention
    pub auto_commit: bool,
}

/// Read-only view of one active recipe entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRecipeSummary {
    pub handle: ActiveRecipeHandle,
    pub class_name: String,
    pub finished: bool,
}

/// Component that manages character initialization through the recipe
/// pending/commit/execute/finish cycle.
pub struct CharacterInitStateComponent {
    init_state: InitState,
    config: InitStateComponentConfig,
    recipes: ActiveRecipeContainer,

    /// Whether a fold-and-recheck is scheduled for the next tick. At most
    /// one per batch, however many recipes finish in the same tick.
    deferred_finish_check: bool,

    waiting_for_controller: Cell<bool>,
}

impl CharacterInitStateComponent {
    pub fn new(config: InitStateComponentConfig) -> Self {
        Self {
            init_state: InitState::None,
            config,
            recipes: ActiveRecipeContainer::new(),
            deferred_finish_check: false,
            waiting_for_controller: Cell::new(false),
        }
    }

    /// Current application state of the committed recipes
    pub fn application_state(&self) -> RecipeApplicationState {
        self.recipes.application_state()
    }

    /// Read-only view of the active recipe entries, in commit order
    pub fn active_recipes(&self) -> Vec<ActiveRecipeSummary> {
        self.recipes
            .entries()
            .iter()
            .map(|entry| ActiveRecipeSummary {
                handle: entry.handle(),
                class_name: entry.class_name().to_string(),
                finished: entry.is_finished(),
            })
            .collect()
    }

    pub fn pending_recipe_count(&self) -> usize {
        self.recipes.pending_count()
    }

    fn mutation_allowed(&self, net: &NetContext) -> bool {
        if !net.has_authority {
            debug!("Pending recipe mutation without authority, ignoring");
            return false;
        }

        if self.recipes.application_state() != RecipeApplicationState::PreCommit {
            debug!("Pending recipe mutation after commit, ignoring");
            return false;
        }

        true
    }

    /// Add a recipe class to the pending list. Returns the invalid handle
    /// without authority or after commit.
    pub fn add_pending_recipe(
        &mut self,
        class: RecipeClass,
        net: &NetContext,
    ) -> PendingRecipeHandle {
        if !self.mutation_allowed(net) {
            return PendingRecipeHandle::default();
        }

        self.recipes.add_pending(class)
    }

    /// Add multiple recipe classes to the pending list, in order
    pub fn add_multiple_pending_recipes(
        &mut self,
        classes: Vec<RecipeClass>,
        net: &NetContext,
    ) -> Vec<PendingRecipeHandle> {
        if !self.mutation_allowed(net) {
            return Vec::new();
        }

        classes
            .into_iter()
            .map(|class| self.recipes.add_pending(class))
            .collect()
    }

    /// Remove a recipe class from the pending list
    pub fn remove_pending_recipe(&mut self, handle: PendingRecipeHandle, net: &NetContext) {
        if !self.mutation_allowed(net) {
            return;
        }

        self.recipes.remove_pending(handle);
    }

    /// Remove multiple recipe classes from the pending list
    pub fn remove_multiple_pending_recipes(
        &mut self,
        handles: &[PendingRecipeHandle],
        net: &NetContext,
    ) {
        if !self.mutation_allowed(net) {
            return;
        }

        for handle in handles {
            self.recipes.remove_pending(*handle);
        }
    }

    /// Clear the pending list
    pub fn clear_pending_recipes(&mut self, net: &NetContext) {
        if !self.mutation_allowed(net) {
            return;
        }

        self.recipes.clear_pending();
    }

    /// Commit the pending recipes and start their setup. Returns whether
    /// the commit happened; the caller re-checks the init chain on
    /// success.
    pub fn commit_pending_recipes(&mut self, pawn: &mut dyn PawnActor) -> bool {
        let net = pawn.net_context();

        if !self.mutation_allowed(&net) {
            return false;
        }

        self.recipes.commit_pending(&net);
        self.handle_all_recipes_committed(pawn);

        true
    }

    /// Shared commit handling for the authority path and the replication
    /// path: record the state, run eligible setups, and stage synchronous
    /// finishes for the deferred fold.
    fn handle_all_recipes_committed(&mut self, pawn: &mut dyn PawnActor) {
        let net = pawn.net_context();

        self.recipes.mark_committed();

        let finished_now = self.recipes.execute_setup(pawn, &net);
        for handle in finished_now {
            self.handle_recipe_setup_finished(handle);
        }
    }

    /// Callback surface for recipes signalling completion. Stages the
    /// handle and schedules at most one deferred fold-and-recheck for the
    /// current tick.
    pub fn handle_recipe_setup_finished(&mut self, handle: ActiveRecipeHandle) {
        debug!("| [{}] Finish Setup", handle);

        self.recipes.stage_pending_finish(handle);
        self.deferred_finish_check = true;
    }

    /// Scheduler hook, driven once per tick. Folds the staged finishes if
    /// a fold is armed; returns whether the caller should re-check the
    /// init chain.
    pub fn tick(&mut self) -> bool {
        if !self.deferred_finish_check {
            return false;
        }

        self.deferred_finish_check = false;
        self.recipes.fold_pending_finish();

        true
    }

    /// Replicated view of the recipe container
    pub fn recipe_snapshot(&self) -> RecipeContainerSnapshot {
        self.recipes.snapshot()
    }

    pub fn recipe_rep_key(&self) -> ReplicationKey {
        self.recipes.rep_key()
    }

    /// Receive the replicated recipe container on a non-authority peer.
    /// The first snapshot is this peer's observation of the commit and
    /// triggers the same commit handling the authority ran. Returns
    /// whether the caller should re-check the init chain.
    pub fn apply_recipe_snapshot(
        &mut self,
        snapshot: &RecipeContainerSnapshot,
        registry: &RecipeRegistry,
        pawn: &mut dyn PawnActor,
    ) -> bool {
        let net = pawn.net_context();

        if net.has_authority {
            return false;
        }

        if !snapshot.key.is_newer_than(self.recipes.rep_key()) {
            return false;
        }

        self.recipes.apply_snapshot(snapshot, registry, &net);

        if self.recipes.application_state() == RecipeApplicationState::PreCommit {
            self.handle_all_recipes_committed(pawn);
            return true;
        }

        false
    }

    /// One-shot controller-changed listener: returns whether a transition
    /// was blocked on possession and should be re-attempted
    pub fn handle_controller_changed(&mut self) -> bool {
        self.waiting_for_controller.replace(false)
    }

    /// Character teardown: release every recipe
    pub fn release(&mut self, pawn: &mut dyn PawnActor) {
        let net = pawn.net_context();
        self.recipes.release(pawn, &net);
    }
}

impl InitStateFeature for CharacterInitStateComponent {
    fn feature_name(&self) -> &'static str {
        INIT_STATE_FEATURE_NAME
    }

    fn init_state(&self) -> InitState {
        self.init_state
    }

    fn set_init_state(&mut self, state: InitState) {
        self.init_state = state;
    }

    fn can_change_init_state_to_data_available(
        &self,
        pawn: &dyn PawnActor,
        _manager: &InitStateManager,
    ) -> bool {
        if self.recipes.application_state() != RecipeApplicationState::Complete {
            return false;
        }

        // Locally-scoped recipes can only evaluate local-control status
        // reliably once possession is established
        let net = pawn.net_context();
        if (net.has_authority || net.locally_controlled) && !pawn.has_controller() {
            self.waiting_for_controller.set(true);
            return false;
        }

        true
    }

    fn handle_change_init_state(
        &mut self,
        pawn: &mut dyn PawnActor,
        _current: InitState,
        desired: InitState,
    ) {
        if desired == InitState::Spawned {
            // Stage the configured default recipes at this time
            let net = pawn.net_context();
            let defaults = self.config.default_recipes.clone();
            self.add_multiple_pending_recipes(defaults, &net);

            if self.config.auto_commit {
                self.commit_pending_recipes(pawn);
            }
        }
    }
}
