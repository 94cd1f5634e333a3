use serde::{Deserialize, Serialize};

/// Session phases. Training is untimed and unrecorded; measured trials are
/// traced and walk the latency sweep.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Training,
    Measured,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Training
    }
}

impl Phase {
    pub fn next(&self) -> Option<Self> {
        match self {
            Phase::Training => Some(Phase::Measured),
            Phase::Measured => None,
        }
    }

    pub fn is_training(&self) -> bool {
        matches!(self, Phase::Training)
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Phase::Measured)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Training => "Training",
            Phase::Measured => "Measured",
        }
    }
}
