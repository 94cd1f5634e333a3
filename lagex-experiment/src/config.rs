use std::path::PathBuf;

use lagex_core::{Experiment, ExperimentError, Result, TrialTemplate, Vec3};
use serde::{Deserialize, Serialize};

use crate::host::{DeviceCharacteristics, HandleNames, InputFeature};

/// Where the measured trials come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrialSource {
    /// Fixed layouts in engine space, identical for every latency.
    Static(Vec<Experiment>),
    /// Layouts drawn by the placement generator, redrawn at every latency change.
    Generated(Vec<TrialTemplate>),
}

impl TrialSource {
    pub fn len(&self) -> usize {
        match self {
            TrialSource::Static(v) => v.len(),
            TrialSource::Generated(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, TrialSource::Generated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementPlane {
    Xy,
    Xz,
    Yz,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    pub plane: PlacementPlane,
    pub max_attempts: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            plane: PlacementPlane::Xy,
            max_attempts: 64,
        }
    }
}

/// Training layouts are drawn fresh for every warm-up trial (experiment units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub diameter_range: (f32, f32),
    pub distance_range: (f32, f32),
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            diameter_range: (0.05, 0.15),
            distance_range: (0.3, 0.6),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    pub directory: PathBuf,
    /// Adds the `button` column of the earliest trace format.
    pub button_column: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            button_column: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    pub controller: DeviceCharacteristics,
    /// Edge-triggered acquisition button.
    pub select: InputFeature,
    /// Level-triggered control that ends training.
    pub exit_training: InputFeature,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            controller: DeviceCharacteristics::RIGHT_HELD_IN_HAND,
            select: InputFeature::MenuButton,
            exit_training: InputFeature::PrimaryButton,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub latencies_ms: Vec<u32>,
    pub trials: TrialSource,
    pub training: TrainingConfig,
    pub placement: PlacementConfig,
    /// When false, any select press ends the trial once the target is the only live object.
    pub require_target_proximity: bool,
    pub trace: TraceConfig,
    pub controls: ControlConfig,
    pub handles: HandleNames,
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            latencies_ms: vec![0, 100, 200, 300],
            trials: TrialSource::Static(vec![
                Experiment::new(
                    Vec3::new(0.75, -0.75, -0.5),
                    0.4,
                    Vec3::new(-0.75, 0.0, -0.75),
                    0.2,
                ),
                Experiment::new(
                    Vec3::new(0.75, -0.6, -0.5),
                    0.1,
                    Vec3::new(-0.75, 0.0, 0.5),
                    0.5,
                ),
            ]),
            training: TrainingConfig::default(),
            placement: PlacementConfig::default(),
            require_target_proximity: false,
            trace: TraceConfig::default(),
            controls: ControlConfig::default(),
            handles: HandleNames::default(),
            seed: None,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| ExperimentError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.latencies_ms.is_empty() {
            return Err(invalid("latency sweep is empty"));
        }
        if self.trials.is_empty() {
            return Err(invalid("trial list is empty"));
        }
        let (d_lo, d_hi) = self.training.diameter_range;
        let (s_lo, s_hi) = self.training.distance_range;
        if !(d_lo > 0.0 && d_lo <= d_hi) {
            return Err(invalid("training diameter range must be positive and ordered"));
        }
        if !(s_lo >= 0.0 && s_lo <= s_hi) {
            return Err(invalid("training distance range must be non-negative and ordered"));
        }
        if self.placement.max_attempts == 0 {
            return Err(invalid("placement needs at least one attempt"));
        }
        if let TrialSource::Generated(templates) = &self.trials {
            if templates.iter().any(|t| t.diameter <= 0.0 || t.distance < 0.0) {
                return Err(invalid("trial templates need a positive diameter"));
            }
        }
        Ok(())
    }

    pub fn latency_count(&self) -> usize {
        self.latencies_ms.len()
    }

    pub fn trial_count(&self) -> usize {
        self.trials.len()
    }
}

fn invalid(reason: &str) -> ExperimentError {
    ExperimentError::InvalidConfig(reason.to_string())
}
