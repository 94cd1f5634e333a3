//! Conversions between engine space and experiment space.
//!
//! The bounding box children live in the engine's local `[-1, 1]^3` cube,
//! while trace files and analysis use the normalized `[0, 1]^3` cube.
//! Sizes follow the same affine map without the offset, `[0, 2] <-> [0, 1]`.

use glam::Vec3;

/// Engine-local position to experiment space.
pub fn to_experiment_origin(p: Vec3) -> Vec3 {
    (p + Vec3::ONE) * 0.5
}

/// Experiment-space position to engine-local space.
pub fn to_game_origin(p: Vec3) -> Vec3 {
    p * 2.0 - Vec3::ONE
}

/// Engine diameter to experiment scale.
pub fn to_experiment_scale(s: f32) -> f32 {
    s * 0.5
}

/// Experiment-scale diameter to engine scale.
pub fn to_game_scale(s: f32) -> f32 {
    s * 2.0
}

/// Renders a vector the way trace files store it: `(x, y, z)` with four decimals.
pub fn format_vec3(v: Vec3) -> String {
    format!("({:.4}, {:.4}, {:.4})", v.x, v.y, v.z)
}

/// Reads back a vector written by [`format_vec3`].
pub fn parse_vec3(s: &str) -> Option<Vec3> {
    let inner = s.trim().trim_start_matches('(').trim_end_matches(')');
    let mut parts = inner.split(',').map(|c| c.trim().parse::<f32>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Vec3::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn corners_map_onto_unit_cube() {
        assert_eq!(to_experiment_origin(Vec3::splat(-1.0)), Vec3::ZERO);
        assert_eq!(to_experiment_origin(Vec3::ONE), Vec3::ONE);
        assert_eq!(to_experiment_origin(Vec3::ZERO), Vec3::splat(0.5));
        assert_eq!(to_game_origin(Vec3::splat(0.5)), Vec3::ZERO);
    }

    #[test]
    fn positions_round_trip() {
        let samples = [
            Vec3::new(0.75, -0.75, -0.5),
            Vec3::new(-0.75, 0.0, 0.5),
            Vec3::new(0.123, 0.987, -0.333),
            Vec3::new(3.0, -7.5, 0.01),
        ];
        for p in samples {
            assert!(to_game_origin(to_experiment_origin(p)).abs_diff_eq(p, EPS));
            assert!(to_experiment_origin(to_game_origin(p)).abs_diff_eq(p, EPS));
        }
    }

    #[test]
    fn scales_round_trip() {
        for s in [0.0_f32, 0.1, 0.4, 1.0, 2.0] {
            assert!((to_game_scale(to_experiment_scale(s)) - s).abs() < EPS);
            assert!((to_experiment_scale(to_game_scale(s)) - s).abs() < EPS);
        }
        assert_eq!(to_experiment_scale(2.0), 1.0);
    }

    #[test]
    fn vector_text_form() {
        let v = Vec3::new(0.875, 0.125, 0.25);
        let text = format_vec3(v);
        assert_eq!(text, "(0.8750, 0.1250, 0.2500)");
        assert_eq!(parse_vec3(&text), Some(v));
        assert_eq!(parse_vec3("(1.0, 2.0)"), None);
        assert_eq!(parse_vec3("(1, 2, x)"), None);
    }
}
