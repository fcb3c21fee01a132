//! # Character Assembly
//!
//! The per-character rig owning the pawn boundary object, the two feature
//! components, and the init-state feature table. Exposes the public driver
//! API hosts call into, and re-runs every feature's chain walk to a
//! fixpoint after any event, standing in for the engine's feature-state
//! broadcast.

use crate::component::data::CharacterDataComponent;
use crate::component::init::{
    CharacterInitStateComponent, InitStateComponentConfig,
};
use crate::component::CharacterEvent;
use crate::data::{AssetCatalog, RecipeSet};
use crate::initstate::{InitStateFeature, InitStateManager};
use crate::pawn::PawnActor;
use crate::recipe::{RecipeClass, RecipeRegistry};
use crate::replication::{ReplicationBundle, ReplicationKey};
use charkit_shared::handle::{ActiveRecipeHandle, PendingRecipeHandle};
use charkit_shared::role::NetContext;
use log::{error, info};
use std::sync::Arc;

/// Construction-time configuration of a character assembly
#[derive(Clone, Default)]
pub struct CharacterAssemblyConfig {
    /// Recipe classes staged automatically at spawn
    pub default_recipes: Vec<RecipeClass>,

    /// Whether to commit the staged recipes at spawn without external
    /// intervention
    pub auto_commit_recipes: bool,
}

/// One character's initialization rig on one peer.
///
/// The authority mutates state through the driver API; non-authority peers
/// only apply replication bundles. Both sides drive the same init-state
/// chain from their own view.
pub struct CharacterAssembly {
    pawn: Box<dyn PawnActor>,
    manager: InitStateManager,
    data: CharacterDataComponent,
    init: CharacterInitStateComponent,
    registry: Arc<RecipeRegistry>,
    catalog: Arc<dyn AssetCatalog>,

    // Last replication keys shipped to peers
    sent_data_key: ReplicationKey,
    sent_modifier_key: ReplicationKey,
    sent_recipe_key: ReplicationKey,
}

impl CharacterAssembly {
    pub fn new(
        pawn: Box<dyn PawnActor>,
        registry: Arc<RecipeRegistry>,
        catalog: Arc<dyn AssetCatalog>,
        config: CharacterAssemblyConfig,
    ) -> Self {
        let mut manager = InitStateManager::new();

        let data = CharacterDataComponent::new();
        let init = CharacterInitStateComponent::new(InitStateComponentConfig {
            default_recipes: config.default_recipes,
            auto_commit: config.auto_commit_recipes,
        });

        manager.register_feature(data.feature_name());
        manager.register_feature(init.feature_name());

        Self {
            pawn,
            manager,
            data,
            init,
            registry,
            catalog,
            sent_data_key: ReplicationKey::default(),
            sent_modifier_key: ReplicationKey::default(),
            sent_recipe_key: ReplicationKey::default(),
        }
    }

    pub fn pawn(&self) -> &dyn PawnActor {
        self.pawn.as_ref()
    }

    pub fn net_context(&self) -> NetContext {
        self.pawn.net_context()
    }

    pub fn data_component(&self) -> &CharacterDataComponent {
        &self.data
    }

    pub fn init_state_component(&self) -> &CharacterInitStateComponent {
        &self.init
    }

    /// Start the initialization flow: both features attempt Spawned and
    /// the chain advances as far as current conditions allow
    pub fn begin_play(&mut self) {
        info!("[{}] Character assembly begin play", self.net_context().describe());
        self.recheck_init_chain();
    }

    /// Set the character data descriptor. Silent no-op without authority
    /// or when data was already set.
    pub fn set_character_data(&mut self, data: Arc<crate::data::CharacterData>) -> bool {
        let applied = self.data.set_character_data(data, self.pawn.as_mut());

        if applied {
            self.recheck_init_chain();
        }

        applied
    }

    /// Set the character data by asset path, resolving through the catalog
    pub fn set_character_data_by_path(&mut self, asset_path: &str) -> bool {
        let Some(data) = self.catalog.resolve_character_data(asset_path) else {
            error!("Unknown character data asset {}", asset_path);
            return false;
        };

        self.set_character_data(data)
    }

    /// Add a recipe class to the pending list. Returns the invalid handle
    /// without authority or after commit.
    pub fn add_pending_recipe(&mut self, class: RecipeClass) -> PendingRecipeHandle {
        let net = self.pawn.net_context();
        self.init.add_pending_recipe(class, &net)
    }

    /// Add multiple recipe classes to the pending list, in order
    pub fn add_multiple_pending_recipes(
        &mut self,
        classes: Vec<RecipeClass>,
    ) -> Vec<PendingRecipeHandle> {
        let net = self.pawn.net_context();
        self.init.add_multiple_pending_recipes(classes, &net)
    }

    /// Stage every recipe of a recipe set, in set order
    pub fn add_recipe_set(&mut self, set: &RecipeSet) -> Vec<PendingRecipeHandle> {
        self.add_multiple_pending_recipes(set.recipes().to_vec())
    }

    /// Remove a recipe class from the pending list
    pub fn remove_pending_recipe(&mut self, handle: PendingRecipeHandle) {
        let net = self.pawn.net_context();
        self.init.remove_pending_recipe(handle, &net);
    }

    /// Remove multiple recipe classes from the pending list
    pub fn remove_multiple_pending_recipes(&mut self, handles: &[PendingRecipeHandle]) {
        let net = self.pawn.net_context();
        self.init.remove_multiple_pending_recipes(handles, &net);
    }

    /// Clear the pending list
    pub fn clear_pending_recipes(&mut self) {
        let net = self.pawn.net_context();
        self.init.clear_pending_recipes(&net);
    }

    /// Commit the pending recipes and start their setup
    pub fn commit_pending_recipes(&mut self) -> bool {
        let committed = self.init.commit_pending_recipes(self.pawn.as_mut());

        if committed {
            self.recheck_init_chain();
        }

        committed
    }

    /// Notification surface for recipes finishing asynchronously. The
    /// finish is folded on the next tick.
    pub fn notify_recipe_finished(&mut self, handle: ActiveRecipeHandle) {
        self.init.handle_recipe_setup_finished(handle);
    }

    /// Scheduler hook, driven once per tick. Folds any staged recipe
    /// finishes and re-checks the init chain once per batch.
    pub fn tick(&mut self) {
        if self.init.tick() {
            self.recheck_init_chain();
        }
    }

    /// Notification that a controller possessed or left the character
    pub fn handle_controller_changed(&mut self) {
        let data_waiting = self.data.handle_controller_changed();
        let init_waiting = self.init.handle_controller_changed();

        if data_waiting || init_waiting {
            self.recheck_init_chain();
        }
    }

    /// Drain queued component notifications
    pub fn drain_events(&mut self) -> Vec<CharacterEvent> {
        self.data.drain_events()
    }

    /// Collect the replicated surfaces that changed since the last take.
    /// Authority only; returns `None` when nothing is dirty.
    pub fn take_replication(&mut self) -> Option<ReplicationBundle> {
        let net = self.pawn.net_context();

        if !net.has_authority {
            return None;
        }

        let mut bundle = ReplicationBundle::default();

        if self.data.data_rep_key().is_newer_than(self.sent_data_key) {
            bundle.character_data = self.data.data_snapshot();
            self.sent_data_key = self.data.data_rep_key();
        }

        if self.data.modifier_rep_key().is_newer_than(self.sent_modifier_key) {
            bundle.modifiers = Some(self.data.modifier_snapshot());
            self.sent_modifier_key = self.data.modifier_rep_key();
        }

        if self.init.recipe_rep_key().is_newer_than(self.sent_recipe_key) {
            bundle.recipes = Some(self.init.recipe_snapshot());
            self.sent_recipe_key = self.init.recipe_rep_key();
        }

        if bundle.is_empty() {
            None
        } else {
            Some(bundle)
        }
    }

    /// Apply a replication bundle received from the authority. Ignored on
    /// the authority itself.
    pub fn apply_replication(&mut self, bundle: &ReplicationBundle) {
        let net = self.pawn.net_context();

        if net.has_authority {
            return;
        }

        let mut changed = false;

        if let Some(snapshot) = &bundle.character_data {
            changed |= self.data.apply_data_snapshot(snapshot, self.catalog.as_ref());
        }

        if let Some(snapshot) = &bundle.modifiers {
            self.data
                .apply_modifier_snapshot(snapshot, self.catalog.as_ref(), self.pawn.as_mut());
            changed = true;
        }

        if let Some(snapshot) = &bundle.recipes {
            changed |= self
                .init
                .apply_recipe_snapshot(snapshot, self.registry.as_ref(), self.pawn.as_mut());
        }

        if changed {
            self.recheck_init_chain();
        }
    }

    /// Character teardown: release recipes and modifiers and leave the
    /// feature table. Terminal.
    pub fn end_play(&mut self) {
        self.init.release(self.pawn.as_mut());
        self.data.release(self.pawn.as_mut());

        self.manager.unregister_feature(self.init.feature_name());
        self.manager.unregister_feature(self.data.feature_name());

        info!("[{}] Character assembly end play", self.net_context().describe());
    }

    /// Re-run every feature's chain walk until no feature advances.
    /// Each transition may unblock a sibling's barrier, so the loop runs
    /// to a fixpoint; the chain is short and strictly forward, so this
    /// terminates quickly.
    fn recheck_init_chain(&mut self) {
        loop {
            let data_advanced = self
                .data
                .check_default_initialization(self.pawn.as_mut(), &mut self.manager);
            let init_advanced = self
                .init
                .check_default_initialization(self.pawn.as_mut(), &mut self.manager);

            if !data_advanced && !init_advanced {
                break;
            }
        }
    }
}
