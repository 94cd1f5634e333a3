//! Interfaces the experiment needs from the engine hosting it.

use std::fmt;

use lagex_core::{ExperimentError, Result, Vec3};
use serde::{Deserialize, Serialize};

/// Scene operations: spawning, destroying and querying objects.
pub trait SceneHost {
    type Handle: Copy + Eq + fmt::Debug;

    fn find(&self, name: &str) -> Option<Self::Handle>;
    fn instantiate(&mut self, template: Self::Handle, parent: Self::Handle) -> Self::Handle;
    /// Local position and uniform scale relative to the parent.
    fn set_local_placement(&mut self, handle: Self::Handle, position: Vec3, diameter: f32);
    fn destroy(&mut self, handle: Self::Handle);
    /// Bounds test of a world-space point against the object's collider.
    fn contains(&self, handle: Self::Handle, point: Vec3) -> bool;
    fn world_position(&self, handle: Self::Handle) -> Vec3;
    fn inverse_transform_point(&self, parent: Self::Handle, world_point: Vec3) -> Vec3;
    fn set_text(&mut self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputFeature {
    MenuButton,
    TriggerButton,
    GripButton,
    PrimaryButton,
    SecondaryButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    Left,
    Right,
}

/// Filter used to enumerate controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCharacteristics {
    pub held_in_hand: bool,
    pub hand: Option<Hand>,
}

impl DeviceCharacteristics {
    pub const RIGHT_HELD_IN_HAND: Self = Self {
        held_in_hand: true,
        hand: Some(Hand::Right),
    };
}

impl fmt::Display for DeviceCharacteristics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hand = match self.hand {
            Some(Hand::Left) => "left",
            Some(Hand::Right) => "right",
            None => "any",
        };
        if self.held_in_hand {
            write!(f, "held-in-hand {hand} controller")
        } else {
            write!(f, "{hand} device")
        }
    }
}

/// Raw device polling.
pub trait InputSource {
    type Device: Clone + fmt::Debug;

    fn devices_with_characteristics(&self, characteristics: DeviceCharacteristics) -> Vec<Self::Device>;
    /// `None` when the device does not expose the feature.
    fn feature_value(&self, device: &Self::Device, feature: InputFeature) -> Option<bool>;
}

/// The controller chosen at session start.
#[derive(Debug, Clone)]
pub struct Controller<D> {
    pub device: D,
}

impl<D: Clone + fmt::Debug> Controller<D> {
    /// Picks the first matching device; an empty enumeration ends the session.
    pub fn resolve<I>(input: &I, characteristics: DeviceCharacteristics) -> Result<Self>
    where
        I: InputSource<Device = D>,
    {
        input
            .devices_with_characteristics(characteristics)
            .into_iter()
            .next()
            .map(|device| Controller { device })
            .ok_or_else(|| ExperimentError::DeviceNotFound {
                characteristics: characteristics.to_string(),
            })
    }

    /// Level read; an absent feature reads as released.
    pub fn held<I>(&self, input: &I, feature: InputFeature) -> bool
    where
        I: InputSource<Device = D>,
    {
        input.feature_value(&self.device, feature).unwrap_or(false)
    }
}

/// Scene object names looked up during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleNames {
    pub source_template: String,
    pub target_template: String,
    pub bounds: String,
    pub pointer: String,
}

impl Default for HandleNames {
    fn default() -> Self {
        Self {
            source_template: "SourceTemplate".into(),
            target_template: "TargetTemplate".into(),
            bounds: "bounding_box".into(),
            pointer: "Pointer".into(),
        }
    }
}

/// Scene objects the scheduler works with, all resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles<H> {
    pub source_template: H,
    pub target_template: H,
    pub bounds: H,
    pub pointer: H,
}

/// Names the host scene has not provided yet. Not an error: the lookup is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub missing: Vec<String>,
}

impl<H: Copy + Eq + fmt::Debug> SceneHandles<H> {
    pub fn resolve<S>(host: &S, names: &HandleNames) -> std::result::Result<Self, Unresolved>
    where
        S: SceneHost<Handle = H>,
    {
        let mut missing = Vec::new();
        let mut lookup = |name: &str| {
            let found = host.find(name);
            if found.is_none() {
                missing.push(name.to_string());
            }
            found
        };
        let source_template = lookup(&names.source_template);
        let target_template = lookup(&names.target_template);
        let bounds = lookup(&names.bounds);
        let pointer = lookup(&names.pointer);
        match (source_template, target_template, bounds, pointer) {
            (Some(source_template), Some(target_template), Some(bounds), Some(pointer)) => Ok(Self {
                source_template,
                target_template,
                bounds,
                pointer,
            }),
            _ => Err(Unresolved { missing }),
        }
    }
}
