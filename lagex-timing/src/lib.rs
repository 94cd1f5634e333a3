pub mod timer;

pub use timer::{CalibrationStats, FrameClock, HighPrecisionTimer, Timer};
