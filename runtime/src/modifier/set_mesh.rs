//! # Set Mesh Modifier
//!
//! Modifier assigning meshes and animation blueprints to a character's
//! mesh slots when its character data is applied.

use crate::modifier::{CharacterModifier, ModifierInstance};
use crate::pawn::{MeshToSet, PawnActor};
use charkit_shared::policy::ModifierPolicy;
use log::debug;

/// Modifier that writes configured mesh changes onto the character's
/// slots. Applies on both server and client by default; a cosmetic-only
/// variant can restrict itself to client peers via the policy.
#[derive(Debug, Clone)]
pub struct SetMeshModifier {
    pub policy: ModifierPolicy,
    pub meshes_to_set: Vec<MeshToSet>,
}

impl SetMeshModifier {
    pub fn new(meshes_to_set: Vec<MeshToSet>) -> Self {
        Self {
            policy: ModifierPolicy::server_and_client(),
            meshes_to_set,
        }
    }
}

impl CharacterModifier for SetMeshModifier {
    fn policy(&self) -> ModifierPolicy {
        self.policy
    }

    fn create_instance(&self) -> Box<dyn ModifierInstance> {
        Box::new(SetMeshInstance {
            meshes_to_set: self.meshes_to_set.clone(),
        })
    }
}

struct SetMeshInstance {
    meshes_to_set: Vec<MeshToSet>,
}

impl ModifierInstance for SetMeshInstance {
    fn on_apply(&mut self, pawn: &mut dyn PawnActor) {
        for mesh_to_set in &self.meshes_to_set {
            let Some(slot) = pawn.mesh_slot_mut(&mesh_to_set.mesh_tag) else {
                continue;
            };

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
    }
}
