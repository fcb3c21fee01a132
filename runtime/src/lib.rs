//! # Character Initialization Runtime
//!
//! Runtime logic of the character initialization and composition framework.
//! A character's data-driven definition (recipes and modifiers) is applied
//! progressively to a live character instance across a client/server
//! topology, so gameplay systems built on top of a character can rely on
//! well-defined readiness guarantees.
//!
//! The system is organized into several sub-modules:
//! - `pawn`: boundary trait for the owning character actor
//! - `initstate`: per-feature initialization state machine and barrier
//! - `recipe`: character recipe definitions and the active recipe protocol
//! - `modifier`: character modifier definitions and the modifier container
//! - `data`: character data assets and the asset catalog boundary
//! - `component`: the data and init-state feature components
//! - `replication`: snapshot types crossing the replication boundary
//! - `assembly`: the per-character rig wiring everything together

// Module declarations
pub mod pawn;
pub mod initstate;
pub mod replication;
pub mod recipe;
pub mod modifier;
pub mod data;
pub mod component;
pub mod assembly;

// Re-export commonly used items
pub use assembly::{CharacterAssembly, CharacterAssemblyConfig};
pub use component::data::CharacterDataComponent;
pub use component::init::CharacterInitStateComponent;
pub use component::CharacterEvent;
pub use data::{AssetCatalog, CharacterData, ModifierSet, RecipeSet, StaticAssetCatalog};
pub use initstate::{InitStateFeature, InitStateManager};
pub use pawn::{MeshSlot, MeshToSet, PawnActor};
pub use recipe::{CharacterRecipe, RecipeClass, RecipeInstance, RecipeRegistry};
pub use replication::ReplicationBundle;
