//! Error types for simulation runs.

use crate::run::RunState;
use sm_fmu::FmuError;
use thiserror::Error;

/// Errors encountered while driving instances.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Unknown instance: {name}")]
    UnknownInstance { name: String },

    #[error(transparent)]
    Fmu(#[from] FmuError),

    /// A step of a started run failed; the run is abandoned.
    #[error("Step {step} failed: {source}")]
    StepFailed { step: u32, source: FmuError },

    #[error("Store error: {message}")]
    Store { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Terminal run state for failures raised while stepping.
    pub fn run_state(&self) -> Option<RunState> {
        match self {
            SimError::StepFailed { step, .. } => Some(RunState::Failed(*step)),
            _ => None,
        }
    }

    /// The component error behind this failure, if any.
    pub fn fmu_error(&self) -> Option<&FmuError> {
        match self {
            SimError::Fmu(e) | SimError::StepFailed { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

impl From<sm_core::CoreError> for SimError {
    fn from(e: sm_core::CoreError) -> Self {
        SimError::Store {
            message: e.to_string(),
        }
    }
}
