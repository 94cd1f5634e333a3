use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Failures surfaced to the host.
///
/// Unresolved scene handles, an already open trace and an empty pose queue
/// are handled where they occur and never reach this type.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("no input device matches {characteristics}")]
    DeviceNotFound { characteristics: String },
    #[error(
        "no legal placement for diameter {diameter:.4} at distance {distance:.4} after {attempts} attempts"
    )]
    PlacementExhausted {
        diameter: f32,
        distance: f32,
        attempts: u32,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("trace I/O: {0}")]
    Trace(#[from] std::io::Error),
    #[error("malformed trace at line {line}: {reason}")]
    TraceFormat { line: usize, reason: String },
}

impl ExperimentError {
    /// Only a missing controller ends a session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. })
    }
}
