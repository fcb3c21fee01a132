//! # Character Recipe System
//!
//! A character recipe is a named, policy-tagged unit of character setup
//! logic that must explicitly signal completion. Recipes are registered by
//! class name; the active-recipe protocol in [`active`] stages, commits,
//! and executes them according to each recipe's instancing and network
//! execution policies.

pub mod active;
pub mod set_mesh;

use crate::pawn::PawnActor;
use charkit_shared::handle::ActiveRecipeHandle;
use charkit_shared::policy::{InstancingPolicy, NetExecutionPolicy};
use charkit_shared::role::NetContext;
use log::warn;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Whether a setup routine completed synchronously or will signal later.
///
/// A `Pending` setup leaves the entry unfinished until external code calls
/// back with the entry's handle; the framework imposes no timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupProgress {
    /// Setup is done; the entry can be marked finished
    Finished,

    /// Setup continues asynchronously and will finish via the handle
    Pending,
}

/// Information handed to a recipe while it sets up a character
pub struct SetupContext<'a> {
    /// Handle of the active recipe entry being set up
    pub handle: ActiveRecipeHandle,

    /// Network-role context the setup runs under
    pub net: NetContext,

    /// The character being set up
    pub pawn: &'a mut dyn PawnActor,
}

/// Immutable, class-level definition of a character recipe.
///
/// A NonInstanced recipe executes against this shared definition and must
/// not hold per-character state; an Instanced recipe gets one live
/// [`RecipeInstance`] per character on each peer eligible to execute it.
pub trait CharacterRecipe: Send + Sync {
    /// How the recipe is instanced when applied
    fn instancing_policy(&self) -> InstancingPolicy {
        InstancingPolicy::Instanced
    }

    /// Where the recipe's setup logic executes on the network
    fn net_execution_policy(&self) -> NetExecutionPolicy {
        NetExecutionPolicy::Both
    }

    /// Create the per-character instance. Must return `Some` when the
    /// instancing policy is Instanced.
    fn create_instance(&self) -> Option<Box<dyn RecipeInstance>> {
        None
    }

    /// Setup entry point for NonInstanced recipes
    fn start_setup_non_instanced(&self, ctx: &mut SetupContext<'_>) -> SetupProgress {
        let _ = ctx;
        SetupProgress::Finished
    }
}

/// Per-character live state of an Instanced recipe
pub trait RecipeInstance: Send {
    /// Setup entry point, executed once the owning entry is committed
    fn start_setup(&mut self, ctx: &mut SetupContext<'_>) -> SetupProgress;

    /// Executed when the character is destroyed
    fn on_destroy(&mut self, pawn: &mut dyn PawnActor) {
        let _ = pawn;
    }
}

/// Reference to a registered recipe class: the class name used as the
/// replicated identity, plus the shared definition.
#[derive(Clone)]
pub struct RecipeClass {
    name: String,
    definition: Arc<dyn CharacterRecipe>,
}

impl RecipeClass {
    pub fn new(name: &str, definition: Arc<dyn CharacterRecipe>) -> Self {
        Self {
            name: name.to_string(),
            definition,
        }
    }

    /// Registered class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared class-level definition
    pub fn definition(&self) -> &Arc<dyn CharacterRecipe> {
        &self.definition
    }
}

impl fmt::Debug for RecipeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipeClass")
            .field("name", &self.name)
            .finish()
    }
}

/// Registry mapping recipe class names to their definitions.
///
/// Peers receiving a replicated recipe entry resolve its class name here
/// to run the same instancing decision the authority ran at commit time.
#[derive(Default)]
pub struct RecipeRegistry {
    classes: HashMap<String, RecipeClass>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipe class, replacing (with a warning) any previous
    /// definition under the same name
    pub fn register(&mut self, name: &str, definition: Arc<dyn CharacterRecipe>) -> RecipeClass {
        let class = RecipeClass::new(name, definition);

        if self.classes.insert(name.to_string(), class.clone()).is_some() {
            warn!("Replacing existing recipe class registration for {}", name);
        }

        class
    }

    /// Look up a recipe class by name
    pub fn resolve(&self, name: &str) -> Option<RecipeClass> {
        self.classes.get(name).cloned()
    }
}

/// Process-wide recipe registry
static RECIPE_REGISTRY: Lazy<Mutex<RecipeRegistry>> =
    Lazy::new(|| Mutex::new(RecipeRegistry::new()));

/// Register a recipe class with the process-wide registry
pub fn register_recipe(name: &str, definition: Arc<dyn CharacterRecipe>) -> RecipeClass {
    let mut registry = RECIPE_REGISTRY.lock().unwrap();
    registry.register(name, definition)
}

/// Look up a recipe class in the process-wide registry
pub fn resolve_recipe(name: &str) -> Option<RecipeClass> {
    let registry = RECIPE_REGISTRY.lock().unwrap();
    registry.resolve(name)
}
