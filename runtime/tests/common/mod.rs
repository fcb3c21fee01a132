//! Shared harness for the integration tests: a test pawn with observable
//! state, recording recipes and modifiers, and catalog/assembly builders.

#![allow(dead_code)]

use charkit_runtime::data::{CharacterData, ModifierSet, StaticAssetCatalog};
use charkit_runtime::modifier::{CharacterModifier, ModifierInstance};
use charkit_runtime::pawn::{ComponentId, MeshSlot, PawnActor};
use charkit_runtime::recipe::{
    CharacterRecipe, RecipeInstance, RecipeRegistry, SetupContext, SetupProgress,
};
use charkit_runtime::replication::{decode_bundle, encode_bundle};
use charkit_runtime::{CharacterAssembly, CharacterAssemblyConfig};
use charkit_shared::handle::ActiveRecipeHandle;
use charkit_shared::policy::{InstancingPolicy, ModifierPolicy, NetExecutionPolicy};
use charkit_shared::property::PropertyValue;
use charkit_shared::role::NetContext;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Shared log of events a test wants to observe after the pawn has been
/// boxed into an assembly.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_entries(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// External knobs of a test pawn, usable after the pawn is boxed
#[derive(Clone)]
pub struct PawnHandle {
    controller: Arc<AtomicBool>,
    pub component_log: EventLog,
}

impl PawnHandle {
    pub fn set_controller(&self, present: bool) {
        self.controller.store(present, Ordering::Relaxed);
    }
}

/// Pawn implementation with one "Body" mesh slot and recording component
/// attachment.
pub struct TestPawn {
    net: NetContext,
    controller: Arc<AtomicBool>,
    properties: HashMap<String, PropertyValue>,
    mesh_slots: HashMap<String, MeshSlot>,
    components: Vec<(ComponentId, String)>,
    next_component_id: ComponentId,
    component_log: EventLog,
}

impl TestPawn {
    pub fn new(net: NetContext) -> (Self, PawnHandle) {
        let controller = Arc::new(AtomicBool::new(false));
        let component_log = new_event_log();

        let mut mesh_slots = HashMap::new();
        mesh_slots.insert("Body".to_string(), MeshSlot::default());

        let pawn = Self {
            net,
            controller: controller.clone(),
            properties: HashMap::new(),
            mesh_slots,
            components: Vec::new(),
            next_component_id: 1,
            component_log: component_log.clone(),
        };

        let handle = PawnHandle {
            controller,
            component_log,
        };

        (pawn, handle)
    }

    pub fn possessed(net: NetContext) -> (Self, PawnHandle) {
        let (pawn, handle) = Self::new(net);
        handle.set_controller(true);
        (pawn, handle)
    }
}

impl PawnActor for TestPawn {
    fn net_context(&self) -> NetContext {
        self.net
    }

    fn has_controller(&self) -> bool {
        self.controller.load(Ordering::Relaxed)
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        self.properties.get(name).cloned()
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) {
        self.properties.insert(name.to_string(), value);
    }

    fn mesh_slot(&self, mesh_tag: &str) -> Option<&MeshSlot> {
        self.mesh_slots.get(mesh_tag)
    }

    fn mesh_slot_mut(&mut self, mesh_tag: &str) -> Option<&mut MeshSlot> {
        self.mesh_slots.get_mut(mesh_tag)
    }

    fn attach_component(&mut self, class_name: &str) -> ComponentId {
        let id = self.next_component_id;
        self.next_component_id += 1;

        self.components.push((id, class_name.to_string()));
        self.component_log
            .lock()
            .unwrap()
            .push(format!("attach:{class_name}"));

        id
    }

    fn detach_component(&mut self, component_id: ComponentId) {
        if let Some(pos) = self.components.iter().position(|(id, _)| *id == component_id) {
            let (_, class_name) = self.components.remove(pos);
            self.component_log
                .lock()
                .unwrap()
                .push(format!("detach:{class_name}"));
        }
    }
}

/// NonInstanced recipe recording its execution into a log
pub struct RecordingRecipe {
    pub name: String,
    pub log: EventLog,
}

impl CharacterRecipe for RecordingRecipe {
    fn instancing_policy(&self) -> InstancingPolicy {
        InstancingPolicy::NonInstanced
    }

    fn start_setup_non_instanced(&self, _ctx: &mut SetupContext<'_>) -> SetupProgress {
        self.log.lock().unwrap().push(format!("setup:{}", self.name));
        SetupProgress::Finished
    }
}

/// Instanced recipe whose setup stays pending until the test finishes it
/// through the handle it records.
pub struct AsyncRecipe {
    pub name: String,
    pub policy: NetExecutionPolicy,
    pub log: EventLog,
    pub started_handles: Arc<Mutex<Vec<ActiveRecipeHandle>>>,
}

impl CharacterRecipe for AsyncRecipe {
    fn net_execution_policy(&self) -> NetExecutionPolicy {
        self.policy
    }

    fn create_instance(&self) -> Option<Box<dyn RecipeInstance>> {
        Some(Box::new(AsyncRecipeInstance {
            name: self.name.clone(),
            log: self.log.clone(),
            started_handles: self.started_handles.clone(),
        }))
    }
}

struct AsyncRecipeInstance {
    name: String,
    log: EventLog,
    started_handles: Arc<Mutex<Vec<ActiveRecipeHandle>>>,
}

impl RecipeInstance for AsyncRecipeInstance {
    fn start_setup(&mut self, ctx: &mut SetupContext<'_>) -> SetupProgress {
        self.log.lock().unwrap().push(format!("setup:{}", self.name));
        self.started_handles.lock().unwrap().push(ctx.handle);
        SetupProgress::Pending
    }

    fn on_destroy(&mut self, _pawn: &mut dyn PawnActor) {
        self.log.lock().unwrap().push(format!("destroy:{}", self.name));
    }
}

/// Modifier recording apply/removal into a log
pub struct RecordingModifier {
    pub name: String,
    pub policy: ModifierPolicy,
    pub log: EventLog,
}

impl RecordingModifier {
    pub fn new(name: &str, policy: ModifierPolicy, log: &EventLog) -> Arc<dyn CharacterModifier> {
        Arc::new(Self {
            name: name.to_string(),
            policy,
            log: log.clone(),
        })
    }
}

impl CharacterModifier for RecordingModifier {
    fn policy(&self) -> ModifierPolicy {
        self.policy
    }

    fn create_instance(&self) -> Box<dyn ModifierInstance> {
        Box::new(RecordingModifierInstance {
            name: self.name.clone(),
            log: self.log.clone(),
        })
    }
}

struct RecordingModifierInstance {
    name: String,
    log: EventLog,
}

impl ModifierInstance for RecordingModifierInstance {
    fn on_apply(&mut self, _pawn: &mut dyn PawnActor) {
        self.log.lock().unwrap().push(format!("apply:{}", self.name));
    }

    fn on_removal(&mut self, _pawn: &mut dyn PawnActor) {
        self.log.lock().unwrap().push(format!("remove:{}", self.name));
    }
}

/// Character data with one modifier set followed by loose modifiers
pub fn character_data(
    asset_path: &str,
    set_modifiers: Vec<Arc<dyn CharacterModifier>>,
    modifiers: Vec<Arc<dyn CharacterModifier>>,
) -> Arc<CharacterData> {
    let sets = if set_modifiers.is_empty() {
        Vec::new()
    } else {
        vec![Arc::new(ModifierSet::new(
            &format!("{asset_path}/Set"),
            set_modifiers,
        ))]
    };

    Arc::new(CharacterData::new(asset_path, sets, modifiers))
}

/// Catalog holding the given character data assets
pub fn catalog_with(data: &[Arc<CharacterData>]) -> Arc<StaticAssetCatalog> {
    let mut catalog = StaticAssetCatalog::new();
    for entry in data {
        catalog.add_character_data(entry.clone());
    }
    Arc::new(catalog)
}

/// Assembly over a possessed test pawn with the given configuration
pub fn assembly(
    net: NetContext,
    registry: &Arc<RecipeRegistry>,
    catalog: &Arc<StaticAssetCatalog>,
    config: CharacterAssemblyConfig,
) -> (CharacterAssembly, PawnHandle) {
    let (pawn, handle) = TestPawn::possessed(net);
    let assembly = CharacterAssembly::new(
        Box::new(pawn),
        registry.clone(),
        catalog.clone(),
        config,
    );
    (assembly, handle)
}

/// Ship every dirty surface from the authority to the peer through the
/// reference JSON encoding, returning how many bundles were delivered.
pub fn pump_replication(authority: &mut CharacterAssembly, peer: &mut CharacterAssembly) -> usize {
    let mut delivered = 0;

    while let Some(bundle) = authority.take_replication() {
        let wire = encode_bundle(&bundle).expect("bundle must encode");
        let received = decode_bundle(&wire).expect("bundle must decode");
        peer.apply_replication(&received);
        delivered += 1;
    }

    delivered
}
