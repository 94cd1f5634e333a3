use glam::{Quat, Vec3};

/// Which parts of a tracked pose are valid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct PoseFlags {
    pub position: bool,
    pub rotation: bool,
}

impl PoseFlags {
    pub const NONE: Self = Self {
        position: false,
        rotation: false,
    };
    pub const POSITION: Self = Self {
        position: true,
        rotation: false,
    };
    pub const ROTATION: Self = Self {
        position: false,
        rotation: true,
    };
    pub const ALL: Self = Self {
        position: true,
        rotation: true,
    };
}

/// The transform the delayed pose is written to.
pub trait PoseTarget {
    fn set_local_position(&mut self, position: Vec3);
    fn set_local_rotation(&mut self, rotation: Quat);
}

/// One tracked pose, stamped with the host time (seconds) of the frame that produced it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PoseSample {
    pub timestamp: f64,
    pub position: Vec3,
    pub rotation: Quat,
    pub flags: PoseFlags,
}

impl PoseSample {
    pub fn new(timestamp: f64, position: Vec3, rotation: Quat, flags: PoseFlags) -> Self {
        Self {
            timestamp,
            position,
            rotation,
            flags,
        }
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.timestamp
    }

    pub fn is_ready(&self, now: f64, latency_ms: u32) -> bool {
        self.age(now) >= f64::from(latency_ms) / 1000.0
    }

    /// Writes only the components the flags mark as valid.
    pub fn apply_to<T: PoseTarget + ?Sized>(&self, target: &mut T) {
        if self.flags.rotation {
            target.set_local_rotation(self.rotation);
        }
        if self.flags.position {
            target.set_local_position(self.position);
        }
    }
}
