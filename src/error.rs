use thiserror::Error;

/// Errors surfaced by the simulation engine.
///
/// Configuration errors are raised before any simulation work starts.
/// `InternalInvariant` indicates a logic defect and aborts the run; it is
/// never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid network config: {0}")]
    InvalidNetworkConfig(String),

    #[error("invalid scenario config: {0}")]
    InvalidScenarioConfig(String),

    #[error("internal invariant violated (rep {rep}, day {day}): {detail}")]
    InternalInvariant {
        rep: usize,
        day: usize,
        detail: String,
    },
}

impl EngineError {
    pub fn invariant(rep: usize, day: usize, detail: impl Into<String>) -> EngineError {
        EngineError::InternalInvariant {
            rep,
            day,
            detail: detail.into(),
        }
    }
}
