//! Variable directory queries over a model description.
//!
//! Listings keep declaration order unless stated otherwise.

use crate::description::{ModelDescription, ScalarVariable};
use crate::error::{FmuError, FmuResult};
use crate::types::{Causality, Variability};

impl ModelDescription {
    pub fn variables(&self) -> &[ScalarVariable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> FmuResult<&ScalarVariable> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| FmuError::UnknownVariable {
                name: name.to_string(),
            })
    }

    pub fn by_causality(&self, causality: Causality) -> Vec<&ScalarVariable> {
        self.variables
            .iter()
            .filter(|v| v.causality == causality)
            .collect()
    }

    /// Variables of `include` causality that have no counterpart of `exclude`
    /// causality with the same name and native type.
    pub fn filter_causality(&self, include: Causality, exclude: Causality) -> Vec<&ScalarVariable> {
        let excluded = self.by_causality(exclude);
        self.by_causality(include)
            .into_iter()
            .filter(|v| !excluded.iter().any(|x| same_signature(v, x)))
            .collect()
    }

    /// Inputs that are not also outputs.
    pub fn inputs(&self) -> Vec<&ScalarVariable> {
        self.filter_causality(Causality::Input, Causality::Output)
    }

    /// Outputs that are not also inputs.
    pub fn outputs(&self) -> Vec<&ScalarVariable> {
        self.filter_causality(Causality::Output, Causality::Input)
    }

    /// Inputs that share name and native type with an output.
    pub fn inout(&self) -> Vec<&ScalarVariable> {
        let outputs = self.by_causality(Causality::Output);
        self.by_causality(Causality::Input)
            .into_iter()
            .filter(|v| outputs.iter().any(|o| same_signature(v, o)))
            .collect()
    }

    /// Fixed and tunable parameters, sorted by name.
    pub fn initial_parameters(&self) -> Vec<&ScalarVariable> {
        let mut params: Vec<&ScalarVariable> = self
            .by_causality(Causality::Parameter)
            .into_iter()
            .filter(|v| matches!(v.variability, Variability::Fixed | Variability::Tunable))
            .collect();
        params.sort_by(|a, b| a.name.cmp(&b.name));
        params
    }
}

fn same_signature(a: &ScalarVariable, b: &ScalarVariable) -> bool {
    a.name == b.name && a.native_type == b.native_type
}
