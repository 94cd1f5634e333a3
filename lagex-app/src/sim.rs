//! Headless stand-in for the VR engine: a scene of spheres, a tracked
//! controller and a scripted participant.

use std::collections::HashMap;

use lagex_core::{PoseTarget, Quat, Vec3};
use lagex_experiment::{DeviceCharacteristics, HandleNames, InputFeature, InputSource, SceneHost};

const SOURCE_TEMPLATE: u32 = 1;
const TARGET_TEMPLATE: u32 = 2;
const BOUNDS: u32 = 3;
const POINTER: u32 = 4;

#[derive(Debug, Clone, Copy)]
struct Sphere {
    template: u32,
    local: Vec3,
    diameter: f32,
}

/// Spheres parented to a bounding box floating in front of the participant.
pub struct SimScene {
    next_handle: u32,
    names: HashMap<String, u32>,
    spheres: HashMap<u32, Sphere>,
    bounds_center: Vec3,
    bounds_half: f32,
    pub pointer: Vec3,
    pub overlay: String,
}

impl SimScene {
    pub fn new(names: &HandleNames) -> Self {
        let names = [
            (names.source_template.clone(), SOURCE_TEMPLATE),
            (names.target_template.clone(), TARGET_TEMPLATE),
            (names.bounds.clone(), BOUNDS),
            (names.pointer.clone(), POINTER),
        ]
        .into_iter()
        .collect();
        Self {
            next_handle: 100,
            names,
            spheres: HashMap::new(),
            bounds_center: Vec3::new(0.0, 1.2, -0.6),
            bounds_half: 0.4,
            pointer: Vec3::new(0.0, 1.0, -0.2),
            overlay: String::new(),
        }
    }

    fn to_world(&self, local: Vec3) -> Vec3 {
        self.bounds_center + local * self.bounds_half
    }

    /// World centre and radius of the object the participant should reach next.
    pub fn goal(&self) -> Option<(Vec3, f32)> {
        let pick = |template| {
            self.spheres
                .values()
                .find(|s| s.template == template)
                .map(|s| (self.to_world(s.local), s.diameter * self.bounds_half * 0.5))
        };
        pick(SOURCE_TEMPLATE).or_else(|| pick(TARGET_TEMPLATE))
    }
}

impl SceneHost for SimScene {
    type Handle = u32;

    fn find(&self, name: &str) -> Option<u32> {
        self.names.get(name).copied()
    }

    fn instantiate(&mut self, template: u32, _parent: u32) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.spheres.insert(
            handle,
            Sphere {
                template,
                local: Vec3::ZERO,
                diameter: 0.0,
            },
        );
        handle
    }

    fn set_local_placement(&mut self, handle: u32, position: Vec3, diameter: f32) {
        if let Some(sphere) = self.spheres.get_mut(&handle) {
            sphere.local = position;
            sphere.diameter = diameter;
        }
    }

    fn destroy(&mut self, handle: u32) {
        self.spheres.remove(&handle);
    }

    fn contains(&self, handle: u32, point: Vec3) -> bool {
        self.spheres.get(&handle).is_some_and(|s| {
            self.to_world(s.local).distance(point) <= s.diameter * self.bounds_half * 0.5
        })
    }

    fn world_position(&self, handle: u32) -> Vec3 {
        match handle {
            POINTER => self.pointer,
            h => self
                .spheres
                .get(&h)
                .map(|s| self.to_world(s.local))
                .unwrap_or(self.bounds_center),
        }
    }

    fn inverse_transform_point(&self, _parent: u32, world_point: Vec3) -> Vec3 {
        (world_point - self.bounds_center) / self.bounds_half
    }

    fn set_text(&mut self, text: &str) {
        self.overlay = text.to_string();
    }
}

/// The in-world pointer driven by the delayed pose.
#[derive(Debug, Default)]
pub struct SimHand {
    pub position: Vec3,
    pub rotation: Quat,
}

impl PoseTarget for SimHand {
    fn set_local_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_local_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimDevice(pub &'static str);

/// One right-hand controller whose buttons are set by the participant script.
#[derive(Debug, Default)]
pub struct SimInput {
    buttons: HashMap<InputFeature, bool>,
}

impl SimInput {
    pub fn set(&mut self, feature: InputFeature, held: bool) {
        self.buttons.insert(feature, held);
    }
}

impl InputSource for SimInput {
    type Device = SimDevice;

    fn devices_with_characteristics(&self, characteristics: DeviceCharacteristics) -> Vec<SimDevice> {
        if characteristics.held_in_hand {
            vec![SimDevice("sim-right-controller")]
        } else {
            Vec::new()
        }
    }

    fn feature_value(&self, _device: &SimDevice, feature: InputFeature) -> Option<bool> {
        self.buttons.get(&feature).copied()
    }
}

/// Closed-loop participant: steers the physical controller by what it sees of
/// the delayed pointer, and clicks after dwelling inside the goal.
pub struct Participant {
    pub controller: Vec3,
    gain: f32,
    max_speed: f32,
    dwell_frames: u32,
    inside_for: u32,
}

impl Participant {
    pub fn new(start: Vec3) -> Self {
        Self {
            controller: start,
            gain: 4.0,
            max_speed: 1.5,
            dwell_frames: 3,
            inside_for: 0,
        }
    }

    /// Moves the controller for one frame; returns whether select is held.
    pub fn step(&mut self, scene: &SimScene, dt: f32) -> bool {
        let Some((goal, radius)) = scene.goal() else {
            self.inside_for = 0;
            return false;
        };
        let error = goal - scene.pointer;
        let velocity = (error * self.gain).clamp_length_max(self.max_speed);
        self.controller += velocity * dt;

        if error.length() <= radius * 0.8 {
            self.inside_for += 1;
        } else {
            self.inside_for = 0;
        }
        // Press on exactly one frame, then release so the next press is a fresh edge.
        self.inside_for == self.dwell_frames
    }
}
