pub mod coords;
pub mod error;
pub mod phase;
pub mod pose;
pub mod trial;

pub use coords::{format_vec3, parse_vec3, to_experiment_origin, to_experiment_scale, to_game_origin, to_game_scale};
pub use error::{ExperimentError, Result};
pub use glam::{Quat, Vec3};
pub use phase::Phase;
pub use pose::{PoseFlags, PoseSample, PoseTarget};
pub use trial::{Experiment, ObjectPresence, TrialResult, TrialState, TrialTemplate};
