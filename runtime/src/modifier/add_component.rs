//! # Add Component Modifier
//!
//! Modifier attaching a dynamically created component to the character
//! when its character data is applied, and detaching it again on removal.

use crate::modifier::{CharacterModifier, ModifierInstance};
use crate::pawn::{ComponentId, PawnActor};
use charkit_shared::policy::ModifierPolicy;
use log::{error, info};

/// Modifier that attaches a component of the configured class
#[derive(Debug, Clone)]
pub struct AddComponentModifier {
    pub policy: ModifierPolicy,

    /// Class name of the component to attach
    pub component_class: String,
}

impl AddComponentModifier {
    pub fn new(component_class: &str) -> Self {
        Self {
            policy: ModifierPolicy::server_and_client(),
            component_class: component_class.to_string(),
        }
    }
}

impl CharacterModifier for AddComponentModifier {
    fn policy(&self) -> ModifierPolicy {
        self.policy
    }

    fn create_instance(&self) -> Box<dyn ModifierInstance> {
        Box::new(AddComponentInstance {
            component_class: self.component_class.clone(),
            dynamic_component: None,
        })
    }
}

struct AddComponentInstance {
    component_class: String,
    dynamic_component: Option<ComponentId>,
}

impl ModifierInstance for AddComponentInstance {
    fn on_apply(&mut self, pawn: &mut dyn PawnActor) {
        if self.component_class.is_empty() {
            error!("Add-component modifier has no component class configured");
            return;
        }

        info!("+Component (Class: {})", self.component_class);
        self.dynamic_component = Some(pawn.attach_component(&self.component_class));
    }

    fn on_removal(&mut self, pawn: &mut dyn PawnActor) {
        if let Some(component_id) = self.dynamic_component.take() {
            pawn.detach_component(component_id);
        }
    }
}
