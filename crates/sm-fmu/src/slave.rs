//! Native co-simulation backend interface.

use crate::description::ModelDescription;
use crate::error::{FmuError, FmuResult};
use crate::status::{CallKind, Status};
use crate::types::{NativeType, NativeValue, ValueReference};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One live co-simulation slave.
///
/// Every call reports a [`Status`]; interpretation is left to the caller.
/// A slave is driven by one caller at a time.
pub trait Slave: Send {
    /// Configure the experiment before initialization.
    fn setup_experiment(&mut self, start_time: f64, stop_time: Option<f64>) -> Status;

    fn enter_initialization_mode(&mut self) -> Status;

    fn exit_initialization_mode(&mut self) -> Status;

    /// Read one variable.
    ///
    /// The value is only meaningful when the status allows proceeding.
    fn get(&mut self, vr: ValueReference, native_type: NativeType) -> (NativeValue, Status);

    fn set(&mut self, vr: ValueReference, value: NativeValue) -> Status;

    /// Advance from `current_time` by `step_size`.
    fn do_step(&mut self, current_time: f64, step_size: f64) -> Status;

    /// Completion status of the last call of `kind`.
    ///
    /// Queried repeatedly while a call reports [`Status::Pending`].
    fn status(&mut self, kind: CallKind) -> Status;

    /// Release native resources. Called exactly once per slave.
    fn terminate(&mut self) -> Status;
}

/// Creates slaves for one model identifier.
pub trait SlaveFactory: Send + Sync {
    fn model_identifier(&self) -> &str;

    fn instantiate(
        &self,
        instance_name: &str,
        description: &ModelDescription,
    ) -> FmuResult<Box<dyn Slave>>;
}

/// Backends keyed by co-simulation model identifier.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: HashMap<String, Arc<dyn SlaveFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the bundled backends.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::bouncing_ball::BouncingBallFactory));
        registry
    }

    /// Later registrations replace earlier ones with the same identifier.
    pub fn register(&mut self, factory: Arc<dyn SlaveFactory>) {
        self.factories
            .insert(factory.model_identifier().to_string(), factory);
    }

    pub fn get(&self, model_identifier: &str) -> FmuResult<Arc<dyn SlaveFactory>> {
        self.factories
            .get(model_identifier)
            .cloned()
            .ok_or_else(|| {
                FmuError::load(format!("no backend for model identifier {model_identifier}"))
            })
    }

    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}
