//! # Replication Snapshots
//!
//! Snapshot types for the three replicated surfaces of a character (the
//! character-data reference, the modifier container, and the active recipe
//! container), plus the dirty-key and id-diff primitives that turn a
//! received snapshot into add/remove events on the receiving peer.
//!
//! The transport is out of scope: snapshots are plain serializable values
//! the host ships however it likes, as long as per-container order is
//! preserved.

use crate::modifier::ModifierRef;
use charkit_shared::handle::{ActiveRecipeHandle, ModifierEntryId};
use charkit_shared::types::CharkitResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Monotonic dirty counter for one replicated surface.
///
/// The authority bumps the key on every mutation; a peer compares the key
/// of an incoming snapshot against the last one it consumed. Bumping with
/// no content change is meaningful: it forces a replication event, which
/// is how an empty commit still notifies clients.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ReplicationKey(u64);

impl ReplicationKey {
    /// Bump the key, marking the surface dirty
    pub fn mark_dirty(&mut self) {
        self.0 += 1;
    }

    /// Whether this key is newer than another peer's view
    pub fn is_newer_than(self, other: ReplicationKey) -> bool {
        self.0 > other.0
    }

    /// Raw counter value
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Replicated view of the character-data reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDataSnapshot {
    pub key: ReplicationKey,

    /// Asset path of the character data, resolved through the catalog on
    /// the receiving peer
    pub data_asset: String,
}

/// Replicated identity of one active recipe entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatedRecipeEntry {
    pub handle: ActiveRecipeHandle,

    /// Registered recipe class name, resolved through the recipe registry
    /// on the receiving peer
    pub recipe_class: String,
}

/// Replicated view of the active recipe container, in commit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeContainerSnapshot {
    pub key: ReplicationKey,
    pub entries: Vec<ReplicatedRecipeEntry>,
}

/// Replicated identity of one applied modifier entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatedModifierEntry {
    pub entry_id: ModifierEntryId,
    pub modifier: ModifierRef,
}

/// Replicated view of the modifier container, in apply order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierContainerSnapshot {
    pub key: ReplicationKey,
    pub entries: Vec<ReplicatedModifierEntry>,
}

/// One authority-to-peer shipment covering whichever surfaces changed
/// since the last one was taken.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationBundle {
    pub character_data: Option<CharacterDataSnapshot>,
    pub modifiers: Option<ModifierContainerSnapshot>,
    pub recipes: Option<RecipeContainerSnapshot>,
}

impl ReplicationBundle {
    pub fn is_empty(&self) -> bool {
        self.character_data.is_none() && self.modifiers.is_none() && self.recipes.is_none()
    }
}

/// Serialize a bundle to the reference JSON encoding
pub fn encode_bundle(bundle: &ReplicationBundle) -> CharkitResult<String> {
    serde_json::to_string(bundle)
        .map_err(|e| format!("Failed to serialize replication bundle: {}", e))
}

/// Parse a bundle from the reference JSON encoding
pub fn decode_bundle(json: &str) -> CharkitResult<ReplicationBundle> {
    serde_json::from_str(json).map_err(|e| format!("Failed to parse replication bundle: {}", e))
}

/// Compare a peer's cached entry ids against an incoming snapshot's ids,
/// producing the ids to add (in incoming order) and the ids to remove.
pub fn diff_replicated_ids<T>(local: &[T], incoming: &[T]) -> (Vec<T>, Vec<T>)
where
    T: Eq + Hash + Copy,
{
    let local_set: HashSet<T> = local.iter().copied().collect();
    let incoming_set: HashSet<T> = incoming.iter().copied().collect();

    let added = incoming
        .iter()
        .copied()
        .filter(|id| !local_set.contains(id))
        .collect();
    let removed = local
        .iter()
        .copied()
        .filter(|id| !incoming_set.contains(id))
        .collect();

    (added, removed)
}
