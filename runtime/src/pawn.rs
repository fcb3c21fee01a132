//! # Pawn Actor Boundary
//!
//! The narrow interface through which the framework reaches the owning
//! character actor. The host engine implements this for its actor type;
//! the framework never assumes anything about the actor beyond it.

use charkit_shared::property::PropertyValue;
use charkit_shared::role::NetContext;
use charkit_shared::types::{Rotator, Vector3};

/// Identifier for a dynamically attached component
pub type ComponentId = u64;

/// One addressable mesh attachment point on a character.
///
/// Asset references are soft: plain asset paths the host resolves when it
/// actually renders. An absent path means the slot keeps whatever it had.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSlot {
    /// Skeletal mesh asset path currently assigned to the slot
    pub skeletal_mesh: Option<String>,

    /// Animation blueprint asset path driving the slot
    pub anim_instance: Option<String>,

    /// Placement relative to the owning actor
    pub relative_location: Vector3,
    pub relative_rotation: Rotator,
    pub relative_scale: Vector3,
}

impl Default for MeshSlot {
    fn default() -> Self {
        Self {
            skeletal_mesh: None,
            anim_instance: None,
            relative_location: Vector3::zero(),
            relative_rotation: Rotator::zero(),
            relative_scale: Vector3::one(),
        }
    }
}

/// Entry data of a mesh slot change, as configured on set-mesh recipes and
/// modifiers. Each field is only written when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshToSet {
    /// Tag identifying the mesh slot to change
    pub mesh_tag: String,

    pub skeletal_mesh: Option<String>,
    pub anim_instance: Option<String>,
    pub new_location: Option<Vector3>,
    pub new_rotation: Option<Rotator>,
    pub new_scale: Option<Vector3>,
}

/// The owning character actor as seen from the framework.
///
/// Provides the network-role queries every role-gated decision depends on,
/// the controller-possession query gating the DataAvailable transition, and
/// the mutation surface recipes and modifiers write through.
pub trait PawnActor {
    /// Network-role context of this peer's view of the character
    fn net_context(&self) -> NetContext;

    /// Whether a controller currently possesses the character
    fn has_controller(&self) -> bool;

    /// Read a property from the character
    fn get_property(&self, name: &str) -> Option<PropertyValue>;

    /// Write a property onto the character
    fn set_property(&mut self, name: &str, value: PropertyValue);

    /// Read access to a mesh slot by tag, if the character has one
    fn mesh_slot(&self, mesh_tag: &str) -> Option<&MeshSlot>;

    /// Mutable access to a mesh slot by tag, if the character has one
    fn mesh_slot_mut(&mut self, mesh_tag: &str) -> Option<&mut MeshSlot>;

    /// Attach a dynamically created component of the given class
    fn attach_component(&mut self, class_name: &str) -> ComponentId;

    /// Detach a previously attached dynamic component
    fn detach_component(&mut self, component_id: ComponentId);
}
