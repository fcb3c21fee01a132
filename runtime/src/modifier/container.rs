//! # Modifier Container
//!
//! The replicated, ordered collection of modifier instances currently
//! applied to a character. The authority adds entries when character data
//! is applied; peers mirror the entry list via replication and run the
//! apply/removal hooks locally, gated by each modifier's policy.

use crate::data::AssetCatalog;
use crate::modifier::{CharacterModifier, ModifierInstance, ModifierRef};
use crate::pawn::PawnActor;
use crate::replication::{
    diff_replicated_ids, ModifierContainerSnapshot, ReplicatedModifierEntry, ReplicationKey,
};
use charkit_shared::handle::ModifierEntryId;
use charkit_shared::role::NetContext;
use log::{debug, error};
use std::collections::HashSet;
use std::sync::Arc;

/// One applied modifier: its replicated identity plus the live instance
pub struct ActiveModifierEntry {
    entry_id: ModifierEntryId,
    modifier: ModifierRef,
    instance: Box<dyn ModifierInstance>,

    /// Whether the policy selected this peer and `on_apply` ran
    applied: bool,
}

impl ActiveModifierEntry {
    pub fn entry_id(&self) -> ModifierEntryId {
        self.entry_id
    }

    pub fn modifier(&self) -> &ModifierRef {
        &self.modifier
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }
}

/// List of modifier instances currently applied to a character
#[derive(Default)]
pub struct ModifierContainer {
    entries: Vec<ActiveModifierEntry>,
    rep_key: ReplicationKey,
}

impl ModifierContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ActiveModifierEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rep_key(&self) -> ReplicationKey {
        self.rep_key
    }

    /// Create and apply an entry for the given modifier. Authority only.
    pub fn add_entry(
        &mut self,
        modifier: ModifierRef,
        definition: &Arc<dyn CharacterModifier>,
        pawn: &mut dyn PawnActor,
        net: &NetContext,
    ) {
        debug_assert!(
            net.has_authority,
            "modifier entries may only be added with authority"
        );

        let mut instance = definition.create_instance();
        let applied = definition.policy().should_apply(net);

        if applied {
            debug!(
                "[{}] Applying modifier {}[{}]",
                net.describe(),
                modifier.data_asset,
                modifier.index
            );
            instance.on_apply(pawn);
        }

        self.entries.push(ActiveModifierEntry {
            entry_id: ModifierEntryId::generate(),
            modifier,
            instance,
            applied,
        });

        self.rep_key.mark_dirty();
    }

    /// Tear down and remove every entry. Authority only.
    pub fn remove_all_entries(&mut self, pawn: &mut dyn PawnActor, net: &NetContext) {
        debug_assert!(
            net.has_authority,
            "modifier entries may only be removed with authority"
        );

        for entry in &mut self.entries {
            if entry.applied {
                entry.instance.on_removal(pawn);
            }
        }

        self.entries.clear();
        self.rep_key.mark_dirty();
    }

    /// Character teardown on any peer: run removal hooks and drop the
    /// entries without touching the replication key
    pub fn release(&mut self, pawn: &mut dyn PawnActor) {
        for entry in &mut self.entries {
            if entry.applied {
                entry.instance.on_removal(pawn);
            }
        }

        self.entries.clear();
    }

    /// Replicated view of the applied entries, in apply order
    pub fn snapshot(&self) -> ModifierContainerSnapshot {
        ModifierContainerSnapshot {
            key: self.rep_key,
            entries: self
                .entries
                .iter()
                .map(|entry| ReplicatedModifierEntry {
                    entry_id: entry.entry_id,
                    modifier: entry.modifier.clone(),
                })
                .collect(),
        }
    }

    /// Reconcile this peer's entries with an incoming snapshot, running
    /// apply hooks for added entries and removal hooks for removed ones.
    /// Unresolvable modifier references are logged and skipped.
    pub fn apply_snapshot(
        &mut self,
        snapshot: &ModifierContainerSnapshot,
        catalog: &dyn AssetCatalog,
        pawn: &mut dyn PawnActor,
        net: &NetContext,
    ) {
        let local_ids: Vec<ModifierEntryId> =
            self.entries.iter().map(|entry| entry.entry_id).collect();
        let incoming_ids: Vec<ModifierEntryId> =
            snapshot.entries.iter().map(|entry| entry.entry_id).collect();

        let (added, removed) = diff_replicated_ids(&local_ids, &incoming_ids);
        let added_set: HashSet<ModifierEntryId> = added.iter().copied().collect();
        let removed_set: HashSet<ModifierEntryId> = removed.into_iter().collect();

        // Removal hooks run before the entries disappear
        for entry in &mut self.entries {
            if removed_set.contains(&entry.entry_id) && entry.applied {
                entry.instance.on_removal(pawn);
            }
        }
        self.entries
            .retain(|entry| !removed_set.contains(&entry.entry_id));

        for replicated in &snapshot.entries {
            if !added_set.contains(&replicated.entry_id) {
                continue;
            }

            let Some(data) = catalog.resolve_character_data(&replicated.modifier.data_asset)
            else {
                error!(
                    "Unknown character data {} in replicated modifier entry, skipping",
                    replicated.modifier.data_asset
                );
                continue;
            };

            let Some(definition) = data.modifier_at(replicated.modifier.index) else {
                error!(
                    "Character data {} has no modifier at index {}, skipping",
                    replicated.modifier.data_asset, replicated.modifier.index
                );
                continue;
            };

            let mut instance = definition.create_instance();
            let applied = definition.policy().should_apply(net);

            if applied {
                debug!(
                    "[{}] Applying replicated modifier {}[{}]",
                    net.describe(),
                    replicated.modifier.data_asset,
                    replicated.modifier.index
                );
                instance.on_apply(pawn);
            }

            self.entries.push(ActiveModifierEntry {
                entry_id: replicated.entry_id,
                modifier: replicated.modifier.clone(),
                instance,
                applied,
            });
        }

        self.rep_key = snapshot.key;
    }
}
