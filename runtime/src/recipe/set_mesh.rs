//! # Set Mesh Recipe
//!
//! NonInstanced recipe assigning meshes, animation blueprints, and
//! placement to a character's mesh slots during setup.

use crate::pawn::MeshToSet;
use crate::recipe::{CharacterRecipe, SetupContext, SetupProgress};
use charkit_shared::policy::{InstancingPolicy, NetExecutionPolicy};
use log::debug;

/// Recipe that writes configured mesh changes onto the character's slots.
///
/// Runs on every peer: mesh assignment is visual state each side derives
/// locally from the same replicated recipe entry.
#[derive(Debug, Clone, Default)]
pub struct SetMeshRecipe {
    pub meshes_to_set: Vec<MeshToSet>,
}

impl SetMeshRecipe {
    pub fn new(meshes_to_set: Vec<MeshToSet>) -> Self {
        Self { meshes_to_set }
    }
}

impl CharacterRecipe for SetMeshRecipe {
    fn instancing_policy(&self) -> InstancingPolicy {
        InstancingPolicy::NonInstanced
    }

    fn net_execution_policy(&self) -> NetExecutionPolicy {
        NetExecutionPolicy::Both
    }

    fn start_setup_non_instanced(&self, ctx: &mut SetupContext<'_>) -> SetupProgress {
        for mesh_to_set in &self.meshes_to_set {
            let Some(slot) = ctx.pawn.mesh_slot_mut(&mesh_to_set.mesh_tag) else {
                continue;
            };

            debug!("+Modify Mesh (Tag: {})", mesh_to_set.mesh_tag);

            if let Some(mesh) = &mesh_to_set.skeletal_mesh {
                debug!("++SkeletalMesh ({})", mesh);
                slot.skeletal_mesh = Some(mesh.clone());
            }

            if let Some(anim) = &mesh_to_set.anim_instance {
                debug!("++AnimInstance ({})", anim);
                slot.anim_instance = Some(anim.clone());
            }

            if let Some(location) = mesh_to_set.new_location {
                slot.relative_location = location;
            }

            if let Some(rotation) = mesh_to_set.new_rotation {
                slot.relative_rotation = rotation;
            }

            if let Some(scale) = mesh_to_set.new_scale {
                slot.relative_scale = scale;
            }
        }

        SetupProgress::Finished
    }
}
