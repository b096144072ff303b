//! Running instances of a loaded component.
//!
//! An instance owns its slave and terminates it exactly once: either through
//! [`Instance::destroy`] or when dropped.

use crate::bridge;
use crate::error::FmuResult;
use crate::package::ComponentDescriptor;
use crate::slave::Slave;
use crate::status::{CallKind, Status, StatusGovernor};
use sm_model::TypedValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub struct Instance {
    name: String,
    descriptor: Arc<ComponentDescriptor>,
    slave: Box<dyn Slave>,
    governor: StatusGovernor,
    time: f64,
    last_status: Status,
    terminated: bool,
}

impl Instance {
    /// Instantiate and initialize a slave.
    ///
    /// Overrides are applied between setup and initialization so that start
    /// values derived from parameters see them. Keys with no matching fixed or
    /// tunable parameter are reported and otherwise ignored.
    pub fn create(
        name: &str,
        descriptor: Arc<ComponentDescriptor>,
        initial_parameters: &BTreeMap<String, String>,
        governor: StatusGovernor,
    ) -> FmuResult<Self> {
        let slave = descriptor.instantiate(name)?;
        let mut instance = Self {
            name: name.to_string(),
            descriptor,
            slave,
            governor,
            time: 0.0,
            last_status: Status::None,
            terminated: false,
        };

        let status = instance.slave.setup_experiment(0.0, None);
        instance.note_setup(status, "setupExperiment");
        instance.apply_parameters(initial_parameters)?;
        let status = instance.slave.enter_initialization_mode();
        instance.note_setup(status, "enterInitializationMode");
        let status = instance.slave.exit_initialization_mode();
        instance.note_setup(status, "exitInitializationMode");

        tracing::debug!(instance = %instance.name, component = %instance.descriptor.name(), "instance created");
        Ok(instance)
    }

    fn note_setup(&mut self, status: Status, call: &str) {
        self.last_status = status;
        if !status.is_ok() {
            tracing::warn!(instance = %self.name, "{call} returned status '{status}'");
        }
    }

    fn apply_parameters(&mut self, overrides: &BTreeMap<String, String>) -> FmuResult<()> {
        let descriptor = Arc::clone(&self.descriptor);
        let description = descriptor.description();
        let mut matched = Vec::new();
        for param in description.initial_parameters() {
            match overrides.get(&param.name) {
                Some(value) => {
                    tracing::debug!("{} --> {}", param.name, value);
                    bridge::write_value(
                        &mut *self.slave,
                        description,
                        &param.name,
                        value,
                        &self.governor,
                    )?;
                    matched.push(param.name.as_str());
                }
                None => {
                    tracing::debug!(
                        "{} = {} (default)",
                        param.name,
                        param.start.as_deref().unwrap_or("")
                    );
                }
            }
        }
        for key in overrides.keys() {
            if !matched.contains(&key.as_str()) {
                tracing::warn!(instance = %self.name, "parameter does not exist: {key}");
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &Arc<ComponentDescriptor> {
        &self.descriptor
    }

    /// Simulated time after the last successful step.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn last_status(&self) -> Status {
        self.last_status
    }

    /// Invoke the native step and return its raw status.
    pub fn advance_step(&mut self, current_time: f64, step_size: f64) -> Status {
        let status = self.slave.do_step(current_time, step_size);
        self.last_status = status;
        status
    }

    /// Step and interpret the status; tracked time moves only on success.
    pub fn do_step(&mut self, current_time: f64, step_size: f64) -> FmuResult<()> {
        let status = self.advance_step(current_time, step_size);
        self.governor.check(
            status,
            Some(&mut *self.slave),
            CallKind::DoStep,
            &format!("doStep(t={current_time}, dt={step_size}) on {}", self.name),
        )?;
        self.time = current_time + step_size;
        Ok(())
    }

    pub fn read_value(&mut self, name: &str) -> FmuResult<TypedValue> {
        let description = self.descriptor.description();
        let variable = description.variable(name)?;
        let value_type = bridge::model_type(variable.native_type)?;
        let value = bridge::read_value(&mut *self.slave, variable, &self.governor)?;
        Ok(TypedValue::new(name, value_type, value))
    }

    pub fn write_value(&mut self, name: &str, value: &str) -> FmuResult<()> {
        bridge::write_value(
            &mut *self.slave,
            self.descriptor.description(),
            name,
            value,
            &self.governor,
        )
    }

    pub fn write_values(&mut self, values: &[TypedValue]) -> FmuResult<()> {
        for value in values {
            self.write_value(&value.name, &value.value)?;
        }
        Ok(())
    }

    /// Current values of every output variable, in declaration order.
    pub fn output_values(&mut self) -> FmuResult<Vec<TypedValue>> {
        let descriptor = Arc::clone(&self.descriptor);
        descriptor
            .description()
            .by_causality(crate::types::Causality::Output)
            .into_iter()
            .map(|v| self.read_value(&v.name))
            .collect()
    }

    /// Terminate the slave. Consumes the instance so it cannot be reused.
    pub fn destroy(mut self) -> Status {
        self.terminate()
    }

    fn terminate(&mut self) -> Status {
        if self.terminated {
            return self.last_status;
        }
        self.terminated = true;
        let status = self.slave.terminate();
        self.last_status = status;
        if !status.is_ok() {
            tracing::warn!(instance = %self.name, "terminate returned status '{status}'");
        }
        tracing::debug!(instance = %self.name, "instance destroyed");
        status
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("component", &self.descriptor.name())
            .field("time", &self.time)
            .field("last_status", &self.last_status)
            .finish()
    }
}
