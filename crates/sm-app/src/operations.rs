//! Handlers behind the derived simulation operations.

use crate::arguments::{self, StepArguments};
use crate::config::ProcessorConfig;
use crate::error::AppResult;
use crate::host::OperationHandler;
use crate::signature;
use sm_fmu::{ComponentDescriptor, Instance, StatusGovernor};
use sm_model::OperationVariable;
use sm_sim::{
    run_steps, run_to_completion, InstanceRegistry, RecordMode, RunOptions, RunRecord, SimError,
    SimResult,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything a handler needs to know about one processed model.
#[derive(Debug, Clone)]
pub struct ModelContext {
    pub name: String,
    pub descriptor: Arc<ComponentDescriptor>,
    /// Initial parameters from the model's parameter file
    pub parameters: BTreeMap<String, String>,
    pub results_per_step: bool,
    pub governor: StatusGovernor,
}

impl ModelContext {
    pub fn new(
        name: &str,
        descriptor: Arc<ComponentDescriptor>,
        parameters: BTreeMap<String, String>,
        config: &ProcessorConfig,
    ) -> Self {
        Self {
            name: name.to_string(),
            descriptor,
            parameters,
            results_per_step: config.results_per_step,
            governor: config.governor(),
        }
    }

    fn record_mode(&self) -> RecordMode {
        if self.results_per_step {
            RecordMode::EveryStep
        } else {
            RecordMode::FinalOnly
        }
    }

    fn run_options(&self, args: &StepArguments, default_start: f64) -> RunOptions {
        RunOptions {
            start_time: args.current_time.unwrap_or(default_start),
            step_size: args.time_step,
            step_count: args.step_count,
            record: self.record_mode(),
        }
    }

    fn results(&self, record: &RunRecord) -> Vec<OperationVariable> {
        if self.results_per_step {
            vec![signature::step_results(&record.steps)]
        } else {
            signature::value_arguments(record.final_values())
        }
    }

    /// Create, run and destroy a fresh instance.
    pub fn run(
        &self,
        input: &[OperationVariable],
        inoutput: &[OperationVariable],
    ) -> AppResult<Vec<OperationVariable>> {
        let args = StepArguments::parse(input, inoutput)?;
        let opts = self.run_options(&args, 0.0);
        let instance_name = InstanceRegistry::generate_name(&self.name);
        tracing::debug!(model = %self.name, instance = %instance_name, steps = opts.step_count, "run requested");
        let record = run_to_completion(
            Arc::clone(&self.descriptor),
            &instance_name,
            &self.parameters,
            self.governor,
            &opts,
            &args.inputs,
        )?;
        Ok(self.results(&record))
    }

    /// Create and register a live instance; invocation properties override
    /// the parameter file.
    pub fn create_instance(
        &self,
        registry: &InstanceRegistry,
        input: &[OperationVariable],
    ) -> AppResult<Vec<OperationVariable>> {
        let mut parameters = self.parameters.clone();
        parameters.extend(arguments::parameter_overrides(input));
        let name = InstanceRegistry::generate_name(&self.name);
        let instance = Instance::create(
            &name,
            Arc::clone(&self.descriptor),
            &parameters,
            self.governor,
        )?;
        let name = registry.insert(instance)?;
        Ok(vec![signature::instance_name_value(&name)])
    }

    /// Instances of other models are reported as unknown.
    fn owns(&self, instance: &Instance) -> SimResult<()> {
        if Arc::ptr_eq(instance.descriptor(), &self.descriptor) {
            Ok(())
        } else {
            Err(SimError::UnknownInstance {
                name: instance.name().to_string(),
            })
        }
    }

    /// Advance a registered instance; time defaults to the instance's own.
    pub fn do_step(
        &self,
        registry: &InstanceRegistry,
        input: &[OperationVariable],
        inoutput: &[OperationVariable],
    ) -> AppResult<Vec<OperationVariable>> {
        let name = arguments::instance_name(input)?;
        let args = StepArguments::parse(input, inoutput)?;
        let record = registry.with_instance(name, |instance| {
            self.owns(instance)?;
            let opts = self.run_options(&args, instance.time());
            run_steps(instance, &opts, &args.inputs)
        })?;
        Ok(self.results(&record))
    }

    pub fn destroy_instance(
        &self,
        registry: &InstanceRegistry,
        input: &[OperationVariable],
    ) -> AppResult<Vec<OperationVariable>> {
        let name = arguments::instance_name(input)?;
        registry.with_instance(name, |instance| self.owns(instance))?;
        registry.destroy(name)?;
        Ok(Vec::new())
    }
}

pub fn run_handler(model: Arc<ModelContext>) -> OperationHandler {
    Arc::new(move |input: &[OperationVariable], inoutput: &[OperationVariable]| {
        model.run(input, inoutput)
    })
}

pub fn create_instance_handler(
    model: Arc<ModelContext>,
    registry: Arc<InstanceRegistry>,
) -> OperationHandler {
    Arc::new(move |input: &[OperationVariable], _: &[OperationVariable]| {
        model.create_instance(&registry, input)
    })
}

pub fn do_step_handler(model: Arc<ModelContext>, registry: Arc<InstanceRegistry>) -> OperationHandler {
    Arc::new(move |input: &[OperationVariable], inoutput: &[OperationVariable]| {
        model.do_step(&registry, input, inoutput)
    })
}

pub fn destroy_instance_handler(
    model: Arc<ModelContext>,
    registry: Arc<InstanceRegistry>,
) -> OperationHandler {
    Arc::new(move |input: &[OperationVariable], _: &[OperationVariable]| {
        model.destroy_instance(&registry, input)
    })
}
