//! # Character Data Component
//!
//! Binds a single immutable character data descriptor to a character and
//! applies its modifiers. The descriptor is set at most once; a second set
//! is a deliberate no-op, not an error. The DataAvailable transition is
//! gated on controller possession, because locally-scoped modifiers can
//! only evaluate true local-control status once possession is established.

use crate::component::CharacterEvent;
use crate::data::{AssetCatalog, CharacterData};
use crate::initstate::{InitStateFeature, InitStateManager};
use crate::modifier::container::ModifierContainer;
use crate::pawn::PawnActor;
use crate::replication::{CharacterDataSnapshot, ModifierContainerSnapshot, ReplicationKey};
use charkit_shared::lifecycle::InitState;
use charkit_shared::role::NetContext;
use log::{debug, error, info};
use std::cell::Cell;
use std::sync::Arc;

/// Feature name this component registers under
pub const DATA_FEATURE_NAME: &str = "CharacterData";

/// Component that manages a character's data descriptor and the modifier
/// container it populates.
pub struct CharacterDataComponent {
    init_state: InitState,
    character_data: Option<Arc<CharacterData>>,
    modifiers: ModifierContainer,
    data_rep_key: ReplicationKey,

    /// Set while a DataAvailable attempt is blocked on possession; a
    /// controller-changed notification re-arms exactly one re-check
    waiting_for_controller: Cell<bool>,

    pending_events: Vec<CharacterEvent>,
}

impl Default for CharacterDataComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterDataComponent {
    pub fn new() -> Self {
        Self {
            init_state: InitState::None,
            character_data: None,
            modifiers: ModifierContainer::new(),
            data_rep_key: ReplicationKey::default(),
            waiting_for_controller: Cell::new(false),
            pending_events: Vec::new(),
        }
    }

    pub fn character_data(&self) -> Option<&Arc<CharacterData>> {
        self.character_data.as_ref()
    }

    pub fn modifiers(&self) -> &ModifierContainer {
        &self.modifiers
    }

    /// Set the character data and apply its modifiers.
    ///
    /// No-op without authority or when data was already set. Returns
    /// whether anything changed; the caller re-checks the init chain on
    /// success.
    pub fn set_character_data(
        &mut self,
        data: Arc<CharacterData>,
        pawn: &mut dyn PawnActor,
    ) -> bool {
        let net = pawn.net_context();

        if !net.has_authority {
            debug!("SetCharacterData called without authority, ignoring");
            return false;
        }

        if let Some(existing) = &self.character_data {
            debug!(
                "Character data already set to {}, ignoring {}",
                existing.asset_path(),
                data.asset_path()
            );
            return false;
        }

        info!(
            "[{}] Applying character data {}",
            net.describe(),
            data.asset_path()
        );

        for (modifier_ref, definition) in data.flattened_modifiers() {
            self.modifiers.add_entry(modifier_ref, &definition, pawn, &net);
        }

        self.character_data = Some(data);
        self.data_rep_key.mark_dirty();

        true
    }

    /// One-shot controller-changed listener: returns whether a transition
    /// was blocked on possession and should be re-attempted
    pub fn handle_controller_changed(&mut self) -> bool {
        self.waiting_for_controller.replace(false)
    }

    pub fn drain_events(&mut self) -> Vec<CharacterEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Replicated view of the data reference, if one is set
    pub fn data_snapshot(&self) -> Option<CharacterDataSnapshot> {
        self.character_data.as_ref().map(|data| CharacterDataSnapshot {
            key: self.data_rep_key,
            data_asset: data.asset_path().to_string(),
        })
    }

    pub fn data_rep_key(&self) -> ReplicationKey {
        self.data_rep_key
    }

    pub fn modifier_snapshot(&self) -> ModifierContainerSnapshot {
        self.modifiers.snapshot()
    }

    pub fn modifier_rep_key(&self) -> ReplicationKey {
        self.modifiers.rep_key()
    }

    /// Receive the replicated data reference on a non-authority peer.
    /// Modifier side effects arrive through the modifier container's own
    /// snapshot; this only records the reference so the init chain can
    /// advance. Returns whether the reference changed.
    pub fn apply_data_snapshot(
        &mut self,
        snapshot: &CharacterDataSnapshot,
        catalog: &dyn AssetCatalog,
    ) -> bool {
        if !snapshot.key.is_newer_than(self.data_rep_key) {
            return false;
        }

        let Some(data) = catalog.resolve_character_data(&snapshot.data_asset) else {
            error!(
                "Unknown character data {} in replicated reference, skipping",
                snapshot.data_asset
            );
            return false;
        };

        debug!("OnRep character data: {}", data.asset_path());

        self.character_data = Some(data);
        self.data_rep_key = snapshot.key;

        true
    }

    /// Receive the replicated modifier entry list on a non-authority peer
    pub fn apply_modifier_snapshot(
        &mut self,
        snapshot: &ModifierContainerSnapshot,
        catalog: &dyn AssetCatalog,
        pawn: &mut dyn PawnActor,
    ) {
        let net = pawn.net_context();
        self.modifiers.apply_snapshot(snapshot, catalog, pawn, &net);
    }

    /// Character teardown: remove every applied modifier
    pub fn release(&mut self, pawn: &mut dyn PawnActor) {
        let net = pawn.net_context();

        if net.has_authority {
            self.modifiers.remove_all_entries(pawn, &net);
        } else {
            self.modifiers.release(pawn);
        }
    }

    fn controller_gate_passes(&self, pawn: &dyn PawnActor, net: &NetContext) -> bool {
        if (net.has_authority || net.locally_controlled) && !pawn.has_controller() {
            self.waiting_for_controller.set(true);
            return false;
        }

        true
    }
}

impl InitStateFeature for CharacterDataComponent {
    fn feature_name(&self) -> &'static str {
        DATA_FEATURE_NAME
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
        // Character data is always required for character initialization
        if self.character_data.is_none() {
            return false;
        }

        self.controller_gate_passes(pawn, &pawn.net_context())
    }

    fn handle_change_init_state(
        &mut self,
        _pawn: &mut dyn PawnActor,
        current: InitState,
        desired: InitState,
    ) {
        if current == InitState::DataAvailable && desired == InitState::DataInitialized {
            self.pending_events.push(CharacterEvent::DataInitialized);
        }
    }
}
