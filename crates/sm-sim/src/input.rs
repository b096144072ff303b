//! Per-step input values.

use sm_model::TypedValue;
use std::collections::BTreeMap;

/// Values to write immediately before a given (1-based) step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepInputs {
    by_step: BTreeMap<u32, Vec<TypedValue>>,
}

impl StepInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any values already registered for `step`.
    pub fn insert(&mut self, step: u32, values: Vec<TypedValue>) {
        self.by_step.insert(step, values);
    }

    pub fn for_step(&self, step: u32) -> &[TypedValue] {
        self.by_step.get(&step).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn steps(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_step.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_step.is_empty()
    }
}

impl FromIterator<(u32, Vec<TypedValue>)> for StepInputs {
    fn from_iter<I: IntoIterator<Item = (u32, Vec<TypedValue>)>>(iter: I) -> Self {
        let mut inputs = Self::new();
        for (step, values) in iter {
            inputs.insert(step, values);
        }
        inputs
    }
}
