//! Multi-step execution of co-simulation instances.
//!
//! Provides:
//! - Fixed-increment step loop with per-step inputs and output recording
//! - Run-to-completion wrapper that always tears the instance down
//! - Component cache and live-instance registry with serialized access

pub mod error;
pub mod input;
pub mod run;
pub mod store;

pub use error::{SimError, SimResult};
pub use input::StepInputs;
pub use run::{
    run_steps, run_steps_with_progress, run_to_completion, RecordMode, RunOptions, RunRecord,
    RunState, StepProgress, StepRecord,
};
pub use store::{ComponentStore, InstanceRegistry, SharedInstance};
