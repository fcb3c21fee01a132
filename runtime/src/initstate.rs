//! # Init-State Machine
//!
//! The generic per-feature initialization state machine and the
//! cross-feature barrier. Every feature component on a character registers
//! with the [`InitStateManager`]; a barrier transition only succeeds once
//! every registered feature has caught up, which keeps sibling components
//! advancing in lockstep.

use crate::pawn::PawnActor;
use charkit_shared::lifecycle::InitState;
use log::{debug, warn};

/// Per-character registry of feature components and their current
/// initialization states.
///
/// The minimum state across registrants is cached and refreshed on every
/// mutation, so the barrier query is O(1).
#[derive(Debug, Default)]
pub struct InitStateManager {
    features: Vec<(&'static str, InitState)>,
    lowest: InitState,
}

impl InitStateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature component, starting at [`InitState::None`]
    pub fn register_feature(&mut self, name: &'static str) {
        if self.features.iter().any(|(existing, _)| *existing == name) {
            warn!("Feature {} is already registered", name);
            return;
        }

        self.features.push((name, InitState::None));
        self.refresh_lowest();
    }

    /// Remove a feature component from the registry
    pub fn unregister_feature(&mut self, name: &str) {
        self.features.retain(|(existing, _)| *existing != name);
        self.refresh_lowest();
    }

    /// Record a feature's new state
    pub fn update_feature_state(&mut self, name: &str, state: InitState) {
        for (existing, current) in &mut self.features {
            if *existing == name {
                *current = state;
                self.refresh_lowest();
                return;
            }
        }

        warn!("Feature {} is not registered, state change dropped", name);
    }

    /// Current state of a registered feature
    pub fn feature_state(&self, name: &str) -> Option<InitState> {
        self.features
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, state)| *state)
    }

    /// Whether every registered feature has reached at least the given state
    pub fn have_all_features_reached(&self, state: InitState) -> bool {
        self.lowest >= state
    }

    /// The minimum state across all registered features
    pub fn lowest_state(&self) -> InitState {
        self.lowest
    }

    fn refresh_lowest(&mut self) {
        self.lowest = self
            .features
            .iter()
            .map(|(_, state)| *state)
            .min()
            .unwrap_or(InitState::GameplayReady);
    }
}

/// A feature component participating in the initialization chain.
///
/// Implementors track their own current state and supply the
/// per-specialization DataAvailable predicate; the chain-walking logic is
/// shared. `check_default_initialization` attempts every eligible
/// transition once per call and must be re-invoked after any external
/// condition changes.
pub trait InitStateFeature {
    /// Stable name this feature registers under
    fn feature_name(&self) -> &'static str;

    /// The feature's current initialization state
    fn init_state(&self) -> InitState;

    /// Store a new current state
    fn set_init_state(&mut self, state: InitState);

    /// Per-specialization predicate for the Spawned -> DataAvailable step
    fn can_change_init_state_to_data_available(
        &self,
        pawn: &dyn PawnActor,
        manager: &InitStateManager,
    ) -> bool;

    /// Side effects of a successful transition
    fn handle_change_init_state(
        &mut self,
        pawn: &mut dyn PawnActor,
        current: InitState,
        desired: InitState,
    ) {
        let _ = (pawn, current, desired);
    }

    /// Whether the transition `current -> desired` is currently permitted.
    ///
    /// The two later steps are barriers: they require every registered
    /// feature to have reached at least the current state, so no feature
    /// runs ahead of its siblings.
    fn can_change_init_state(
        &self,
        pawn: &dyn PawnActor,
        manager: &InitStateManager,
        current: InitState,
        desired: InitState,
    ) -> bool {
        match (current, desired) {
            // The owning pawn is live for as long as this component exists
            (InitState::None, InitState::Spawned) => true,

            (current, InitState::DataAvailable) if current >= InitState::Spawned => {
                self.can_change_init_state_to_data_available(pawn, manager)
            }

            (InitState::DataAvailable, InitState::DataInitialized) => {
                manager.have_all_features_reached(InitState::DataAvailable)
            }

            (InitState::DataInitialized, InitState::GameplayReady) => {
                manager.have_all_features_reached(InitState::DataInitialized)
            }

            _ => false,
        }
    }

    /// Attempt a single transition to `desired`, firing side effects and
    /// recording the new state with the manager on success.
    fn try_to_change_init_state(
        &mut self,
        pawn: &mut dyn PawnActor,
        manager: &mut InitStateManager,
        desired: InitState,
    ) -> bool {
        let current = self.init_state();

        if !self.can_change_init_state(pawn, manager, current, desired) {
            return false;
        }

        self.set_init_state(desired);
        manager.update_feature_state(self.feature_name(), desired);

        debug!(
            "[{}] {}: {:?} -> {:?}",
            pawn.net_context().describe(),
            self.feature_name(),
            current,
            desired
        );

        self.handle_change_init_state(pawn, current, desired);

        true
    }

    /// Walk the chain from the current state forward, attempting every
    /// eligible transition once. Returns whether any transition succeeded.
    fn check_default_initialization(
        &mut self,
        pawn: &mut dyn PawnActor,
        manager: &mut InitStateManager,
    ) -> bool {
        let mut advanced = false;

        while let Some(desired) = self.init_state().next() {
            if !self.try_to_change_init_state(pawn, manager, desired) {
                break;
            }
            advanced = true;
        }

        advanced
    }
}
