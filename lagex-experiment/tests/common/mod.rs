#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use lagex_core::{PoseTarget, Quat, Vec3};
use lagex_experiment::{
    DeviceCharacteristics, ExperimentConfig, InputFeature, InputSource, SceneHandles, SceneHost,
    TickInput, TraceConfig,
};

pub const SOURCE_TEMPLATE: u32 = 1;
pub const TARGET_TEMPLATE: u32 = 2;
pub const BOUNDS: u32 = 3;
pub const POINTER: u32 = 4;

#[derive(Debug, Clone, Copy)]
pub struct Object {
    pub template: u32,
    pub local: Vec3,
    pub diameter: f32,
}

/// Spheres parented to a bounding box centred at `bounds_center` with half-extent `bounds_half`.
pub struct MockScene {
    next: u32,
    pub names: HashMap<String, u32>,
    pub objects: HashMap<u32, Object>,
    pub spawned: Vec<(u32, u32)>,
    pub destroyed: Vec<u32>,
    pub pointer: Vec3,
    pub text: String,
    pub bounds_center: Vec3,
    pub bounds_half: f32,
}

impl MockScene {
    pub fn new() -> Self {
        let mut scene = Self::empty();
        scene.add_name("SourceTemplate", SOURCE_TEMPLATE);
        scene.add_name("TargetTemplate", TARGET_TEMPLATE);
        scene.add_name("bounding_box", BOUNDS);
        scene.add_name("Pointer", POINTER);
        scene
    }

    /// A scene whose objects have not loaded yet.
    pub fn empty() -> Self {
        Self {
            next: 100,
            names: HashMap::new(),
            objects: HashMap::new(),
            spawned: Vec::new(),
            destroyed: Vec::new(),
            pointer: Vec3::new(5.0, 5.0, 5.0),
            text: String::new(),
            bounds_center: Vec3::new(0.0, 1.0, -0.5),
            bounds_half: 0.5,
        }
    }

    pub fn add_name(&mut self, name: &str, handle: u32) {
        self.names.insert(name.to_string(), handle);
    }

    pub fn handles(&self) -> SceneHandles<u32> {
        SceneHandles {
            source_template: SOURCE_TEMPLATE,
            target_template: TARGET_TEMPLATE,
            bounds: BOUNDS,
            pointer: POINTER,
        }
    }

    fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.bounds_center + local * self.bounds_half
    }

    pub fn live(&self, template: u32) -> Option<u32> {
        self.objects
            .iter()
            .find(|(_, o)| o.template == template)
            .map(|(h, _)| *h)
    }

    /// Moves the pointer onto the live object spawned from `template`.
    pub fn point_at(&mut self, template: u32) {
        let handle = self.live(template).expect("object should be live");
        self.pointer = self.world_position(handle);
    }

    pub fn point_away(&mut self) {
        self.pointer = Vec3::new(5.0, 5.0, 5.0);
    }
}

impl SceneHost for MockScene {
    type Handle = u32;

    fn find(&self, name: &str) -> Option<u32> {
        self.names.get(name).copied()
    }

    fn instantiate(&mut self, template: u32, _parent: u32) -> u32 {
        let handle = self.next;
        self.next += 1;
        self.objects.insert(
            handle,
            Object {
                template,
                local: Vec3::ZERO,
                diameter: 0.0,
            },
        );
        self.spawned.push((template, handle));
        handle
    }

    fn set_local_placement(&mut self, handle: u32, position: Vec3, diameter: f32) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.local = position;
            object.diameter = diameter;
        }
    }

    fn destroy(&mut self, handle: u32) {
        self.objects.remove(&handle);
        self.destroyed.push(handle);
    }

    fn contains(&self, handle: u32, point: Vec3) -> bool {
        self.objects.get(&handle).is_some_and(|o| {
            let radius = o.diameter * self.bounds_half * 0.5;
            self.local_to_world(o.local).distance(point) <= radius
        })
    }

    fn world_position(&self, handle: u32) -> Vec3 {
        if handle == POINTER {
            return self.pointer;
        }
        self.objects
            .get(&handle)
            .map(|o| self.local_to_world(o.local))
            .unwrap_or(Vec3::ZERO)
    }

    fn inverse_transform_point(&self, _parent: u32, world_point: Vec3) -> Vec3 {
        (world_point - self.bounds_center) / self.bounds_half
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

pub struct MockInput {
    pub devices: Vec<&'static str>,
    pub buttons: HashMap<InputFeature, bool>,
}

impl MockInput {
    pub fn new() -> Self {
        Self {
            devices: vec!["right-controller"],
            buttons: HashMap::new(),
        }
    }

    pub fn without_devices() -> Self {
        Self {
            devices: Vec::new(),
            buttons: HashMap::new(),
        }
    }

    pub fn set(&mut self, feature: InputFeature, held: bool) {
        self.buttons.insert(feature, held);
    }
}

impl InputSource for MockInput {
    type Device = &'static str;

    fn devices_with_characteristics(&self, _c: DeviceCharacteristics) -> Vec<&'static str> {
        self.devices.clone()
    }

    fn feature_value(&self, _device: &&'static str, feature: InputFeature) -> Option<bool> {
        self.buttons.get(&feature).copied()
    }
}

#[derive(Debug, Default)]
pub struct DrivenTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub writes: usize,
}

impl PoseTarget for DrivenTransform {
    fn set_local_position(&mut self, position: Vec3) {
        self.position = position;
        self.writes += 1;
    }

    fn set_local_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }
}

pub fn config_in(dir: &Path) -> ExperimentConfig {
    ExperimentConfig {
        trace: TraceConfig {
            directory: dir.to_path_buf(),
            button_column: false,
        },
        seed: Some(1),
        ..ExperimentConfig::default()
    }
}

pub fn at(now: f64) -> TickInput {
    TickInput {
        now,
        ..TickInput::default()
    }
}

pub fn press(now: f64) -> TickInput {
    TickInput {
        now,
        select: true,
        ..TickInput::default()
    }
}

pub fn exit(now: f64) -> TickInput {
    TickInput {
        now,
        exit_training: true,
        ..TickInput::default()
    }
}
