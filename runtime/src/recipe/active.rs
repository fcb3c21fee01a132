//! # Active Recipe Container
//!
//! The replicated, ordered collection of committed character recipes and
//! the pending/commit/execute/finish protocol that drives it. Pending
//! registrations live only on the authority; committed entries replicate
//! and each peer independently decides whether to instantiate and execute
//! an entry based on its own network role.

use crate::pawn::PawnActor;
use crate::recipe::{RecipeClass, RecipeRegistry, SetupContext, SetupProgress};
use crate::replication::{
    diff_replicated_ids, RecipeContainerSnapshot, ReplicatedRecipeEntry, ReplicationKey,
};
use charkit_shared::handle::{ActiveRecipeHandle, PendingRecipeHandle};
use charkit_shared::lifecycle::RecipeApplicationState;
use charkit_shared::policy::InstancingPolicy;
use charkit_shared::role::NetContext;
use log::{debug, error, info};
use std::cell::Cell;
use std::collections::HashSet;

use super::RecipeInstance;

/// Data of one character recipe currently applied to a character.
///
/// The handle and class name replicate as the entry's identity; the
/// instance and finished flag are local to each peer.
pub struct ActiveRecipeEntry {
    handle: ActiveRecipeHandle,
    class: RecipeClass,
    instance: Option<Box<dyn RecipeInstance>>,
    finished: bool,
}

impl ActiveRecipeEntry {
    /// Authority-side constructor, assigning a fresh handle at commit time
    fn new(class: RecipeClass) -> Self {
        Self {
            handle: ActiveRecipeHandle::generate(),
            class,
            instance: None,
            finished: false,
        }
    }

    /// Peer-side constructor for an entry received via replication,
    /// keeping the authority-assigned handle
    fn from_replicated(handle: ActiveRecipeHandle, class: RecipeClass) -> Self {
        Self {
            handle,
            class,
            instance: None,
            finished: false,
        }
    }

    pub fn handle(&self) -> ActiveRecipeHandle {
        self.handle
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    /// Runs when the entry becomes visible on this peer, either at commit
    /// time on the authority or via replication on everyone else
    fn handle_committed(&mut self, net: &NetContext) {
        self.try_create_instance(net);

        info!("[{}] Committed: {}", net.describe(), self.debug_string());
    }

    /// Create an instance if the recipe is Instanced and this peer is
    /// eligible to execute it
    fn try_create_instance(&mut self, net: &NetContext) {
        let definition = self.class.definition().clone();

        if definition.instancing_policy() == InstancingPolicy::Instanced
            && definition.net_execution_policy().executes_on(net)
        {
            self.instance = definition.create_instance();

            if self.instance.is_none() {
                error!(
                    "{} | Instanced recipe class produced no instance",
                    self.debug_string()
                );
            }
        }
    }

    /// Run the setup routine if this peer is eligible; ineligible entries
    /// are marked finished immediately so the aggregate completion never
    /// waits on a role that will not run the recipe.
    fn try_execute_setup(
        &mut self,
        pawn: &mut dyn PawnActor,
        net: &NetContext,
    ) -> Option<SetupProgress> {
        let definition = self.class.definition().clone();

        if !definition.net_execution_policy().executes_on(net) {
            self.mark_finished();
            return None;
        }

        let mut ctx = SetupContext {
            handle: self.handle,
            net: *net,
            pawn,
        };

        match definition.instancing_policy() {
            InstancingPolicy::Instanced => {
                if let Some(instance) = self.instance.as_mut() {
                    debug!("| [{}][Instanced] Start Setup ({})", ctx.handle, self.class.name());
                    Some(instance.start_setup(&mut ctx))
                } else {
                    error!(
                        "{} | Tried to execute, but no instance has been created",
                        self.debug_string()
                    );
                    None
                }
            }
            InstancingPolicy::NonInstanced => {
                debug!(
                    "| [{}][NonInstanced] Start Setup ({})",
                    ctx.handle,
                    self.class.name()
                );
                Some(definition.start_setup_non_instanced(&mut ctx))
            }
        }
    }

    /// Monotonic: never cleared once set
    fn mark_finished(&mut self) {
        self.finished = true;
    }

    /// Teardown hook for instanced entries
    fn notify_destroy(&mut self, pawn: &mut dyn PawnActor) {
        if let Some(instance) = self.instance.as_mut() {
            debug!("| [{}][Instanced] Destroy ({})", self.handle, self.class.name());
            instance.on_destroy(pawn);
        }
    }

    fn debug_string(&self) -> String {
        format!(
            "[{}](Class:{}, Instance:{})",
            self.handle,
            self.class.name(),
            if self.instance.is_some() { "Yes" } else { "No" }
        )
    }
}

/// Ordered collection of active character recipes plus the authority-only
/// pending registry and the per-tick finish staging set.
///
/// The application state is derived lazily: the cached value is only ever
/// upgraded Committed -> Complete, never downgraded.
pub struct ActiveRecipeContainer {
    entries: Vec<ActiveRecipeEntry>,

    /// Pending recipe classes, authority-side only, never replicated.
    /// Order-preserving: commit order equals add order.
    pending_recipes: Vec<(PendingRecipeHandle, RecipeClass)>,

    /// Handles that finished setup but have not been folded into the
    /// entries' finished flags yet
    recipes_pending_finish: HashSet<ActiveRecipeHandle>,

    application_state: Cell<RecipeApplicationState>,

    rep_key: ReplicationKey,
}

impl Default for ActiveRecipeContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveRecipeContainer {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            pending_recipes: Vec::new(),
            recipes_pending_finish: HashSet::new(),
            application_state: Cell::new(RecipeApplicationState::PreCommit),
            rep_key: ReplicationKey::default(),
        }
    }

    /// Current application state, upgrading the cached Committed state to
    /// Complete the first time every entry is observed finished
    pub fn application_state(&self) -> RecipeApplicationState {
        if self.application_state.get() == RecipeApplicationState::Committed {
            if self.entries.iter().all(|entry| entry.finished) {
                self.application_state.set(RecipeApplicationState::Complete);
            }
        }

        self.application_state.get()
    }

    pub fn entries(&self) -> &[ActiveRecipeEntry] {
        &self.entries
    }

    pub fn pending_count(&self) -> usize {
        self.pending_recipes.len()
    }

    pub fn rep_key(&self) -> ReplicationKey {
        self.rep_key
    }

    /// Add a recipe class to the pending registry, returning a fresh
    /// handle for later removal
    pub fn add_pending(&mut self, class: RecipeClass) -> PendingRecipeHandle {
        let handle = PendingRecipeHandle::generate();
        self.pending_recipes.push((handle, class));
        handle
    }

    /// Remove the pending registration with the given handle
    pub fn remove_pending(&mut self, handle: PendingRecipeHandle) {
        self.pending_recipes.retain(|(existing, _)| *existing != handle);
    }

    /// Drop every pending registration
    pub fn clear_pending(&mut self) {
        self.pending_recipes.clear();
    }

    /// Convert every pending registration into an active entry, in add
    /// order, and clear the pending registry.
    ///
    /// Always marks the container dirty, so an empty commit still causes
    /// a replication event on every peer.
    pub fn commit_pending(&mut self, net: &NetContext) {
        for (_, class) in self.pending_recipes.drain(..) {
            let mut entry = ActiveRecipeEntry::new(class);
            entry.handle_committed(net);

            self.rep_key.mark_dirty();
            self.entries.push(entry);
        }

        // Cause a replication event even if no recipes were committed
        self.rep_key.mark_dirty();
    }

    /// Record that commit has happened; one-way, never revisited
    pub fn mark_committed(&mut self) {
        if self.application_state.get() == RecipeApplicationState::PreCommit {
            self.application_state.set(RecipeApplicationState::Committed);
        }
    }

    /// Run every entry's setup routine for this peer, returning the
    /// handles whose setup finished synchronously
    pub fn execute_setup(
        &mut self,
        pawn: &mut dyn PawnActor,
        net: &NetContext,
    ) -> Vec<ActiveRecipeHandle> {
        let mut finished_now = Vec::new();

        for entry in &mut self.entries {
            if let Some(SetupProgress::Finished) = entry.try_execute_setup(pawn, net) {
                finished_now.push(entry.handle);
            }
        }

        finished_now
    }

    /// Stage a handle that finished setup for the next fold
    pub fn stage_pending_finish(&mut self, handle: ActiveRecipeHandle) {
        self.recipes_pending_finish.insert(handle);
    }

    /// Fold staged finishes into the entries' finished flags, returning
    /// how many entries were marked
    pub fn fold_pending_finish(&mut self) -> usize {
        let mut marked = 0;

        for entry in &mut self.entries {
            if self.recipes_pending_finish.contains(&entry.handle) && !entry.finished {
                entry.mark_finished();
                marked += 1;
            }
        }

        self.recipes_pending_finish.clear();
        marked
    }

    /// Character teardown: run every instanced entry's teardown hook,
    /// then clear all entries, pending registrations, and finish tracking.
    /// Terminal and one-way.
    pub fn release(&mut self, pawn: &mut dyn PawnActor, net: &NetContext) {
        for entry in &mut self.entries {
            entry.notify_destroy(pawn);
        }

        self.entries.clear();
        self.pending_recipes.clear();
        self.recipes_pending_finish.clear();

        info!("[{}] All character recipes released", net.describe());
    }

    /// Replicated view of the committed entries, in commit order
    pub fn snapshot(&self) -> RecipeContainerSnapshot {
        RecipeContainerSnapshot {
            key: self.rep_key,
            entries: self
                .entries
                .iter()
                .map(|entry| ReplicatedRecipeEntry {
                    handle: entry.handle,
                    recipe_class: entry.class.name().to_string(),
                })
                .collect(),
        }
    }

    /// Reconcile this peer's entries with an incoming snapshot. Each newly
    /// visible entry runs the same instancing decision the authority ran
    /// at commit time, based on this peer's own role. Returns the handles
    /// of the added entries.
    pub fn apply_snapshot(
        &mut self,
        snapshot: &RecipeContainerSnapshot,
        registry: &RecipeRegistry,
        net: &NetContext,
    ) -> Vec<ActiveRecipeHandle> {
        let local_ids: Vec<ActiveRecipeHandle> =
            self.entries.iter().map(|entry| entry.handle).collect();
        let incoming_ids: Vec<ActiveRecipeHandle> =
            snapshot.entries.iter().map(|entry| entry.handle).collect();

        let (added, _removed) = diff_replicated_ids(&local_ids, &incoming_ids);
        let added_set: HashSet<ActiveRecipeHandle> = added.iter().copied().collect();

        let mut added_handles = Vec::new();

        for replicated in &snapshot.entries {
            if !added_set.contains(&replicated.handle) {
                continue;
            }

            let Some(class) = registry.resolve(&replicated.recipe_class) else {
                error!(
                    "Unknown recipe class {} in replicated entry, skipping",
                    replicated.recipe_class
                );
                continue;
            };

            let mut entry = ActiveRecipeEntry::from_replicated(replicated.handle, class);
            entry.handle_committed(net);

            self.entries.push(entry);
            added_handles.push(replicated.handle);
        }

        self.rep_key = snapshot.key;

        added_handles
    }
}
