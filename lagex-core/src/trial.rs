use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::coords::{to_experiment_origin, to_experiment_scale};
use crate::phase::Phase;

/// Layout of one trial, in engine space and engine scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub source_position: Vec3,
    pub source_diameter: f32,
    pub target_position: Vec3,
    pub target_diameter: f32,
    pub separation_distance: f32,
}

impl Experiment {
    pub fn new(
        source_position: Vec3,
        source_diameter: f32,
        target_position: Vec3,
        target_diameter: f32,
    ) -> Self {
        Self {
            source_position,
            source_diameter,
            target_position,
            target_diameter,
            separation_distance: source_position.distance(target_position),
        }
    }

    pub fn source_experiment_position(&self) -> Vec3 {
        to_experiment_origin(self.source_position)
    }

    pub fn target_experiment_position(&self) -> Vec3 {
        to_experiment_origin(self.target_position)
    }

    pub fn source_experiment_size(&self) -> f32 {
        to_experiment_scale(self.source_diameter)
    }

    pub fn target_experiment_size(&self) -> f32 {
        to_experiment_scale(self.target_diameter)
    }
}

/// Generated-mode trial request, in experiment units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialTemplate {
    pub diameter: f32,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPresence {
    BothAlive,
    SourceGone,
    TargetGone,
    BothGone,
}

impl ObjectPresence {
    pub fn from_alive(source_alive: bool, target_alive: bool) -> Self {
        match (source_alive, target_alive) {
            (true, true) => Self::BothAlive,
            (false, true) => Self::SourceGone,
            (true, false) => Self::TargetGone,
            (false, false) => Self::BothGone,
        }
    }
}

/// Snapshot of the scheduler's position in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrialState {
    pub phase: Phase,
    pub trial_index: usize,
    pub latency_index: usize,
    pub source_alive: bool,
    pub target_alive: bool,
    pub previous_button_value: bool,
}

impl TrialState {
    pub fn presence(&self) -> ObjectPresence {
        ObjectPresence::from_alive(self.source_alive, self.target_alive)
    }
}

/// Recorded result per measured trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_index: usize,
    pub latency_ms: u32,
    pub source: Vec3,
    pub source_size: f32,
    pub target: Vec3,
    pub target_size: f32,
    pub source_acquired_at: f64,
    pub completed_at: f64,
    pub movement_time: f64,
    pub trace_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separation_is_engine_distance() {
        let e = Experiment::new(Vec3::new(0.5, 0.0, 0.0), 0.2, Vec3::new(-0.5, 0.0, 0.0), 0.2);
        assert!((e.separation_distance - 1.0).abs() < 1e-6);
        assert_eq!(e.source_experiment_position(), Vec3::new(0.75, 0.5, 0.5));
        assert!((e.target_experiment_size() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn presence_follows_liveness() {
        let mut state = TrialState::default();
        assert_eq!(state.presence(), ObjectPresence::BothGone);
        state.source_alive = true;
        state.target_alive = true;
        assert_eq!(state.presence(), ObjectPresence::BothAlive);
        state.source_alive = false;
        assert_eq!(state.presence(), ObjectPresence::SourceGone);
    }
}
