use std::f32::consts::TAU;

use lagex_core::{to_game_scale, ExperimentError, Result, Vec3};
use rand::Rng;

use crate::config::{PlacementConfig, PlacementPlane};

/// A generated source/target pair in engine space, with the shared engine diameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub source: Vec3,
    pub target: Vec3,
    pub diameter: f32,
}

/// Rejection sampler for symmetric source/target layouts inside the bounding cube.
#[derive(Debug, Clone)]
pub struct PlacementGenerator {
    plane: PlacementPlane,
    max_attempts: u32,
}

impl PlacementGenerator {
    pub fn new(config: &PlacementConfig) -> Self {
        Self {
            plane: config.plane,
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Draws a layout for `diameter` and `distance`, both in experiment units.
    ///
    /// Both centres must keep an engine radius of clearance from every face of
    /// the `[-1, 1]^3` cube. Any `distance <= 1 - diameter` is accepted on the
    /// first draw; longer separations depend on the drawn angle, and
    /// separations that cannot fit give up after `max_attempts`.
    pub fn generate<R: Rng>(&self, rng: &mut R, diameter: f32, distance: f32) -> Result<Placement> {
        let engine_diameter = to_game_scale(diameter);
        let limit = 1.0 - engine_diameter * 0.5;
        let length = to_game_scale(distance);

        for _ in 0..self.max_attempts {
            let angle = rng.random_range(0.0..TAU);
            let direction = self.in_plane(angle) * length;
            let source = direction * 0.5;
            let target = -source;
            if is_legal(source, limit) && is_legal(target, limit) {
                return Ok(Placement {
                    source,
                    target,
                    diameter: engine_diameter,
                });
            }
        }

        Err(ExperimentError::PlacementExhausted {
            diameter,
            distance,
            attempts: self.max_attempts,
        })
    }

    fn in_plane(&self, angle: f32) -> Vec3 {
        let (s, c) = angle.sin_cos();
        match self.plane {
            PlacementPlane::Xy => Vec3::new(c, s, 0.0),
            PlacementPlane::Xz => Vec3::new(c, 0.0, s),
            PlacementPlane::Yz => Vec3::new(0.0, c, s),
        }
    }
}

fn is_legal(p: Vec3, limit: f32) -> bool {
    limit >= 0.0 && p.abs().max_element() <= limit
}
