//! # Character Data Assets
//!
//! Immutable, shareable descriptors of a character's composition, and the
//! asset catalog boundary through which soft references resolve. A
//! character data asset lists ordered modifier sets followed by ordered
//! modifiers; applying it produces a deterministic, order-preserving
//! sequence of modifier applications.

use crate::modifier::{CharacterModifier, ModifierRef};
use crate::recipe::RecipeClass;
use std::collections::HashMap;
use std::sync::Arc;

/// Collection of modifiers shared among multiple character data assets.
///
/// Modifiers execute according to the order of the array.
pub struct ModifierSet {
    asset_path: String,
    modifiers: Vec<Arc<dyn CharacterModifier>>,
}

impl ModifierSet {
    pub fn new(asset_path: &str, modifiers: Vec<Arc<dyn CharacterModifier>>) -> Self {
        Self {
            asset_path: asset_path.to_string(),
            modifiers,
        }
    }

    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    pub fn modifiers(&self) -> &[Arc<dyn CharacterModifier>] {
        &self.modifiers
    }
}

/// Data used to spawn a character operated by a player or AI.
///
/// Character data represents the character itself: in a game with multiple
/// characters to choose from, there is one of these per character. The
/// asset is content-addressed by its path, which is also the replicated
/// identity of the reference.
///
/// Modifier sets execute before the data's own modifiers.
pub struct CharacterData {
    asset_path: String,
    modifier_sets: Vec<Arc<ModifierSet>>,
    modifiers: Vec<Arc<dyn CharacterModifier>>,
}

impl CharacterData {
    pub fn new(
        asset_path: &str,
        modifier_sets: Vec<Arc<ModifierSet>>,
        modifiers: Vec<Arc<dyn CharacterModifier>>,
    ) -> Self {
        Self {
            asset_path: asset_path.to_string(),
            modifier_sets,
            modifiers,
        }
    }

    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    /// The full ordered modifier sequence: every set's modifiers in set
    /// order, then the data's own modifiers. Each is paired with its
    /// replicated identity.
    pub fn flattened_modifiers(&self) -> Vec<(ModifierRef, Arc<dyn CharacterModifier>)> {
        let mut flattened = Vec::new();

        for set in &self.modifier_sets {
            for modifier in set.modifiers() {
                let index = flattened.len() as u32;
                flattened.push((ModifierRef::new(&self.asset_path, index), modifier.clone()));
            }
        }

        for modifier in &self.modifiers {
            let index = flattened.len() as u32;
            flattened.push((ModifierRef::new(&self.asset_path, index), modifier.clone()));
        }

        flattened
    }

    /// Definition at the given flattened index, if any
    pub fn modifier_at(&self, index: u32) -> Option<Arc<dyn CharacterModifier>> {
        let mut remaining = index as usize;

        for set in &self.modifier_sets {
            if remaining < set.modifiers().len() {
                return Some(set.modifiers()[remaining].clone());
            }
            remaining -= set.modifiers().len();
        }

        self.modifiers.get(remaining).cloned()
    }

    /// Total number of modifiers in the flattened sequence
    pub fn modifier_count(&self) -> usize {
        self.modifier_sets
            .iter()
            .map(|set| set.modifiers().len())
            .sum::<usize>()
            + self.modifiers.len()
    }
}

/// Bundle of recipe classes addable to a character in one call.
///
/// Recipes are staged according to the order of the array.
pub struct RecipeSet {
    asset_path: String,
    recipes: Vec<RecipeClass>,
}

impl RecipeSet {
    pub fn new(asset_path: &str, recipes: Vec<RecipeClass>) -> Self {
        Self {
            asset_path: asset_path.to_string(),
            recipes,
        }
    }

    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    pub fn recipes(&self) -> &[RecipeClass] {
        &self.recipes
    }
}

/// Boundary through which soft asset references resolve.
///
/// The framework treats a reference as either present or absent; loading
/// is the host's concern.
pub trait AssetCatalog: Send + Sync {
    fn resolve_character_data(&self, asset_path: &str) -> Option<Arc<CharacterData>>;

    fn resolve_recipe_set(&self, asset_path: &str) -> Option<Arc<RecipeSet>>;
}

/// In-memory catalog of pre-registered assets
#[derive(Default)]
pub struct StaticAssetCatalog {
    character_data: HashMap<String, Arc<CharacterData>>,
    recipe_sets: HashMap<String, Arc<RecipeSet>>,
}

impl StaticAssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_character_data(&mut self, data: Arc<CharacterData>) {
        self.character_data
            .insert(data.asset_path().to_string(), data);
    }

    pub fn add_recipe_set(&mut self, set: Arc<RecipeSet>) {
        self.recipe_sets.insert(set.asset_path().to_string(), set);
    }
}

impl AssetCatalog for StaticAssetCatalog {
    fn resolve_character_data(&self, asset_path: &str) -> Option<Arc<CharacterData>> {
        self.character_data.get(asset_path).cloned()
    }

    fn resolve_recipe_set(&self, asset_path: &str) -> Option<Arc<RecipeSet>> {
        self.recipe_sets.get(asset_path).cloned()
    }
}
