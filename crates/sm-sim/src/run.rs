//! Multi-step execution of a running instance.

use crate::error::{SimError, SimResult};
use crate::input::StepInputs;
use sm_fmu::{ComponentDescriptor, FmuResult, Instance, StatusGovernor};
use sm_model::TypedValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which step records a run keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordMode {
    /// One record per step (default).
    #[default]
    EveryStep,
    /// Only the record of the last step.
    FinalOnly,
}

/// Options for a multi-step run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    /// Simulated time at the start of step 1 (seconds)
    pub start_time: f64,
    /// Fixed increment per step (seconds)
    pub step_size: f64,
    /// Number of steps, at least one
    pub step_count: u32,
    pub record: RecordMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            step_size: 1e-2,
            step_count: 1,
            record: RecordMode::default(),
        }
    }
}

impl RunOptions {
    fn validate(&self) -> SimResult<()> {
        if !self.start_time.is_finite() {
            return Err(SimError::InvalidArg {
                what: "start time must be finite",
            });
        }
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(SimError::InvalidArg {
                what: "step size must be positive and finite",
            });
        }
        if self.step_count == 0 {
            return Err(SimError::InvalidArg {
                what: "step count must be positive",
            });
        }
        Ok(())
    }
}

/// Lifecycle of one started run.
///
/// Reported through [`StepProgress::state`], [`RunRecord::state`] and
/// [`SimError::run_state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Step `n` completed and more steps follow.
    Stepping(u32),
    Finished,
    /// Step `n` failed.
    Failed(u32),
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Finished | RunState::Failed(_))
    }
}

/// Output values after one step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepRecord {
    /// 1-based step index
    pub step: u32,
    pub values: Vec<TypedValue>,
}

/// Result of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    pub steps: Vec<StepRecord>,
    /// Simulated time after the last step
    pub end_time: f64,
    pub state: RunState,
}

impl RunRecord {
    /// Outputs after the last step.
    pub fn final_values(&self) -> &[TypedValue] {
        self.steps
            .last()
            .map(|r| r.values.as_slice())
            .unwrap_or(&[])
    }
}

/// Progress report emitted after each step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepProgress {
    pub step: u32,
    pub state: RunState,
    pub step_count: u32,
    pub sim_time: f64,
    pub fraction_complete: f64,
}

/// Drive `instance` through `opts.step_count` steps.
///
/// Any failure aborts the run and no partial record is returned. The
/// instance is left alive either way.
pub fn run_steps(
    instance: &mut Instance,
    opts: &RunOptions,
    inputs: &StepInputs,
) -> SimResult<RunRecord> {
    run_steps_with_progress(instance, opts, inputs, None)
}

pub fn run_steps_with_progress(
    instance: &mut Instance,
    opts: &RunOptions,
    inputs: &StepInputs,
    mut progress: Option<&mut dyn FnMut(StepProgress)>,
) -> SimResult<RunRecord> {
    opts.validate()?;
    for step in inputs.steps() {
        if step == 0 || step > opts.step_count {
            tracing::debug!(step, "ignoring inputs for out-of-range step");
        }
    }

    let mut t = opts.start_time;
    let mut records = Vec::with_capacity(match opts.record {
        RecordMode::EveryStep => opts.step_count as usize,
        RecordMode::FinalOnly => 1,
    });

    for step in 1..=opts.step_count {
        tracing::trace!(instance = instance.name(), step, t);
        let values = match execute_step(instance, step, t, opts.step_size, inputs) {
            Ok(values) => values,
            Err(source) => {
                let err = SimError::StepFailed { step, source };
                tracing::warn!(instance = instance.name(), state = ?err.run_state(), "run failed: {err}");
                return Err(err);
            }
        };
        if opts.record == RecordMode::FinalOnly {
            records.clear();
        }
        records.push(StepRecord { step, values });
        t += opts.step_size;

        if let Some(cb) = progress.as_mut() {
            let state = if step == opts.step_count {
                RunState::Finished
            } else {
                RunState::Stepping(step)
            };
            cb(StepProgress {
                step,
                state,
                step_count: opts.step_count,
                sim_time: t,
                fraction_complete: step as f64 / opts.step_count as f64,
            });
        }
    }
    tracing::debug!(instance = instance.name(), steps = opts.step_count, end_time = t, "run finished");

    Ok(RunRecord {
        steps: records,
        end_time: t,
        state: RunState::Finished,
    })
}

fn execute_step(
    instance: &mut Instance,
    step: u32,
    t: f64,
    dt: f64,
    inputs: &StepInputs,
) -> FmuResult<Vec<TypedValue>> {
    instance.write_values(inputs.for_step(step))?;
    instance.do_step(t, dt)?;
    instance.output_values()
}

/// Create an instance, run it, and destroy it on every exit path.
pub fn run_to_completion(
    descriptor: Arc<ComponentDescriptor>,
    instance_name: &str,
    initial_parameters: &BTreeMap<String, String>,
    governor: StatusGovernor,
    opts: &RunOptions,
    inputs: &StepInputs,
) -> SimResult<RunRecord> {
    opts.validate()?;
    let mut instance = Instance::create(instance_name, descriptor, initial_parameters, governor)?;
    let result = run_steps(&mut instance, opts, inputs);
    instance.destroy();
    result
}
