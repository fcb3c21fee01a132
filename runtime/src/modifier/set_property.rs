//! # Set Property Modifier
//!
//! Modifier writing configured property values onto the character when its
//! character data is applied. Overwritten previous values are restored on
//! removal.

use crate::modifier::{CharacterModifier, ModifierInstance};
use crate::pawn::PawnActor;
use charkit_shared::policy::ModifierPolicy;
use charkit_shared::property::PropertyValue;
use log::{debug, error};

/// Modifier that writes the configured properties onto the character
#[derive(Debug, Clone)]
pub struct SetPropertyModifier {
    pub policy: ModifierPolicy,

    /// Property name/value pairs to write, in order
    pub properties: Vec<(String, PropertyValue)>,
}

impl SetPropertyModifier {
    pub fn new(properties: Vec<(String, PropertyValue)>) -> Self {
        Self {
            policy: ModifierPolicy::server_and_client(),
            properties,
        }
    }
}

impl CharacterModifier for SetPropertyModifier {
    fn policy(&self) -> ModifierPolicy {
        self.policy
    }

    fn create_instance(&self) -> Box<dyn ModifierInstance> {
        Box::new(SetPropertyInstance {
            properties: self.properties.clone(),
            previous_values: Vec::new(),
        })
    }
}

struct SetPropertyInstance {
    properties: Vec<(String, PropertyValue)>,
    previous_values: Vec<(String, Option<PropertyValue>)>,
}

impl ModifierInstance for SetPropertyInstance {
    fn on_apply(&mut self, pawn: &mut dyn PawnActor) {
        for (name, value) in &self.properties {
            if name.is_empty() {
                error!("Set-property modifier has an entry with no property name");
                continue;
            }

            debug!("+Property ({}: {})", name, value.display_string());

            self.previous_values
                .push((name.clone(), pawn.get_property(name)));
            pawn.set_property(name, value.clone());
        }
    }

    fn on_removal(&mut self, pawn: &mut dyn PawnActor) {
        // Restore in reverse so overlapping writes unwind correctly
        for (name, previous) in self.previous_values.drain(..).rev() {
            if let Some(value) = previous {
                pawn.set_property(&name, value);
            }
        }
    }
}
