//! # Character Modifier System
//!
//! A character modifier is a role-gated, one-shot character mutation
//! applied as part of a character data descriptor. Unlike recipes,
//! modifiers have no staged protocol: they apply immediately and are torn
//! down when the character is destroyed.

pub mod add_component;
pub mod container;
pub mod set_mesh;
pub mod set_property;

use crate::pawn::PawnActor;
use charkit_shared::policy::ModifierPolicy;
use serde::{Deserialize, Serialize};

/// Immutable, class-level definition of a character modifier.
///
/// Definitions live inside character data assets; applying one creates a
/// [`ModifierInstance`] holding whatever live state the mutation produced.
pub trait CharacterModifier: Send + Sync {
    /// Role gates deciding whether this modifier applies on a given peer
    fn policy(&self) -> ModifierPolicy {
        ModifierPolicy::default()
    }

    /// Create the per-character instance carrying the applied state
    fn create_instance(&self) -> Box<dyn ModifierInstance>;
}

/// Live state of an applied modifier.
///
/// `on_apply` is only invoked on peers the definition's policy selects;
/// `on_removal` runs when the owning entry is removed, and must tolerate
/// the instance never having been applied.
pub trait ModifierInstance: Send {
    /// Executed when the owning character data is applied
    fn on_apply(&mut self, pawn: &mut dyn PawnActor);

    /// Executed when the character is rebuilt or destroyed
    fn on_removal(&mut self, pawn: &mut dyn PawnActor) {
        let _ = pawn;
    }
}

/// Replicated identity of a modifier: the character data asset it came
/// from plus its position in that asset's flattened modifier sequence.
/// Peers resolve the pair back to a definition through the asset catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierRef {
    /// Asset path of the owning character data
    pub data_asset: String,

    /// Index into the data's flattened modifier sequence
    pub index: u32,
}

impl ModifierRef {
    pub fn new(data_asset: &str, index: u32) -> Self {
        Self {
            data_asset: data_asset.to_string(),
            index,
        }
    }
}
