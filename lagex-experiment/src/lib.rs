pub mod config;
pub mod driver;
pub mod host;
pub mod placement;
pub mod queue;
pub mod state;
pub mod trace;
pub mod trigger;

pub use config::{ExperimentConfig, PlacementConfig, PlacementPlane, TraceConfig, TrainingConfig, TrialSource};
pub use driver::{DelayedPoseDriver, TrackedPose};
pub use host::{Controller, DeviceCharacteristics, HandleNames, InputFeature, InputSource, SceneHandles, SceneHost, Unresolved};
pub use placement::{Placement, PlacementGenerator};
pub use queue::DelayedPoseQueue;
pub use state::{SchedulerEvent, TickInput, TrialScheduler};
pub use trace::{TraceHeader, TraceRecord, TraceSample, TraceWriter};
pub use trigger::EdgeTrigger;
