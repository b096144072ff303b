//! Parsed `modelDescription.xml`.
//!
//! Only the parts needed to drive a co-simulation slave are kept: identity,
//! the co-simulation model identifier, the default experiment and the scalar
//! variables. Unknown elements are ignored.

use crate::error::{FmuError, FmuResult};
use crate::types::{Causality, NativeType, ValueReference, Variability};
use quick_xml::escape::escape;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarVariable {
    pub name: String,
    pub value_reference: ValueReference,
    pub causality: Causality,
    pub variability: Variability,
    pub native_type: NativeType,
    pub description: Option<String>,
    pub start: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultExperiment {
    pub start_time: Option<f64>,
    pub stop_time: Option<f64>,
    pub step_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescription {
    pub fmi_version: String,
    pub model_name: String,
    pub guid: String,
    pub description: Option<String>,
    /// Co-simulation model identifier, used to pick the backend.
    pub model_identifier: String,
    pub default_experiment: Option<DefaultExperiment>,
    pub(crate) variables: Vec<ScalarVariable>,
}

impl ModelDescription {
    pub fn parse(xml: &str) -> FmuResult<Self> {
        let raw: XmlModelDescription = quick_xml::de::from_str(xml)
            .map_err(|e| FmuError::load(format!("invalid model description: {e}")))?;
        Self::try_from(raw)
    }

    pub fn new(
        model_name: impl Into<String>,
        model_identifier: impl Into<String>,
        variables: Vec<ScalarVariable>,
    ) -> FmuResult<Self> {
        ensure_unique_names(&variables)?;
        Ok(Self {
            fmi_version: "2.0".to_string(),
            model_name: model_name.into(),
            guid: String::new(),
            description: None,
            model_identifier: model_identifier.into(),
            default_experiment: None,
            variables,
        })
    }

    /// Render back to FMI 2.0 XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = write!(
            out,
            "<fmiModelDescription fmiVersion=\"{}\" modelName=\"{}\" guid=\"{}\"",
            escape(&self.fmi_version),
            escape(&self.model_name),
            escape(&self.guid)
        );
        if let Some(description) = &self.description {
            let _ = write!(out, " description=\"{}\"", escape(description));
        }
        out.push_str(">\n");
        let _ = writeln!(
            out,
            "  <CoSimulation modelIdentifier=\"{}\"/>",
            escape(&self.model_identifier)
        );
        if let Some(experiment) = &self.default_experiment {
            out.push_str("  <DefaultExperiment");
            for (attr, value) in [
                ("startTime", experiment.start_time),
                ("stopTime", experiment.stop_time),
                ("stepSize", experiment.step_size),
            ] {
                if let Some(value) = value {
                    let _ = write!(out, " {attr}=\"{value}\"");
                }
            }
            out.push_str("/>\n");
        }
        out.push_str("  <ModelVariables>\n");
        for v in &self.variables {
            let _ = write!(
                out,
                "    <ScalarVariable name=\"{}\" valueReference=\"{}\"",
                escape(&v.name),
                v.value_reference
            );
            if v.causality != Causality::Other {
                let _ = write!(out, " causality=\"{}\"", v.causality);
            }
            if v.variability != Variability::Other {
                let _ = write!(out, " variability=\"{}\"", v.variability.as_str());
            }
            if let Some(description) = &v.description {
                let _ = write!(out, " description=\"{}\"", escape(description));
            }
            out.push_str(">\n");
            match &v.start {
                Some(start) => {
                    let _ = writeln!(
                        out,
                        "      <{} start=\"{}\"/>",
                        v.native_type,
                        escape(start)
                    );
                }
                None => {
                    let _ = writeln!(out, "      <{}/>", v.native_type);
                }
            }
            out.push_str("    </ScalarVariable>\n");
        }
        out.push_str("  </ModelVariables>\n</fmiModelDescription>\n");
        out
    }
}

fn ensure_unique_names(variables: &[ScalarVariable]) -> FmuResult<()> {
    let mut seen = HashSet::new();
    for v in variables {
        if !seen.insert(v.name.as_str()) {
            return Err(FmuError::load(format!("duplicate variable name: {}", v.name)));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct XmlModelDescription {
    #[serde(rename = "@fmiVersion")]
    fmi_version: String,
    #[serde(rename = "@modelName")]
    model_name: String,
    #[serde(rename = "@guid", default)]
    guid: String,
    #[serde(rename = "@description", default)]
    description: Option<String>,
    #[serde(rename = "CoSimulation", default)]
    co_simulation: Option<XmlCoSimulation>,
    #[serde(rename = "DefaultExperiment", default)]
    default_experiment: Option<XmlDefaultExperiment>,
    #[serde(rename = "ModelVariables", default)]
    model_variables: XmlModelVariables,
}

#[derive(Debug, Deserialize)]
struct XmlCoSimulation {
    #[serde(rename = "@modelIdentifier")]
    model_identifier: String,
}

#[derive(Debug, Deserialize)]
struct XmlDefaultExperiment {
    #[serde(rename = "@startTime", default)]
    start_time: Option<f64>,
    #[serde(rename = "@stopTime", default)]
    stop_time: Option<f64>,
    #[serde(rename = "@stepSize", default)]
    step_size: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlModelVariables {
    #[serde(rename = "ScalarVariable", default)]
    variables: Vec<XmlScalarVariable>,
}

#[derive(Debug, Deserialize)]
struct XmlScalarVariable {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@valueReference")]
    value_reference: ValueReference,
    #[serde(rename = "@causality", default)]
    causality: Option<String>,
    #[serde(rename = "@variability", default)]
    variability: Option<String>,
    #[serde(rename = "@description", default)]
    description: Option<String>,
    #[serde(rename = "Real", default)]
    real: Option<XmlTypeAttributes>,
    #[serde(rename = "Integer", default)]
    integer: Option<XmlTypeAttributes>,
    #[serde(rename = "Boolean", default)]
    boolean: Option<XmlTypeAttributes>,
    #[serde(rename = "String", default)]
    string: Option<XmlTypeAttributes>,
    #[serde(rename = "Enumeration", default)]
    enumeration: Option<XmlTypeAttributes>,
}

#[derive(Debug, Deserialize)]
struct XmlTypeAttributes {
    #[serde(rename = "@start", default)]
    start: Option<String>,
}

impl TryFrom<XmlScalarVariable> for ScalarVariable {
    type Error = FmuError;

    fn try_from(raw: XmlScalarVariable) -> FmuResult<Self> {
        let (native_type, attributes) = match (
            raw.real,
            raw.integer,
            raw.boolean,
            raw.string,
            raw.enumeration,
        ) {
            (Some(a), None, None, None, None) => (NativeType::Real, a),
            (None, Some(a), None, None, None) => (NativeType::Integer, a),
            (None, None, Some(a), None, None) => (NativeType::Boolean, a),
            (None, None, None, Some(a), None) => (NativeType::String, a),
            (None, None, None, None, Some(a)) => (NativeType::Enumeration, a),
            _ => {
                return Err(FmuError::load(format!(
                    "variable {} must declare exactly one type",
                    raw.name
                )))
            }
        };
        Ok(ScalarVariable {
            causality: Causality::parse(raw.causality.as_deref()),
            variability: Variability::parse(raw.variability.as_deref()),
            name: raw.name,
            value_reference: raw.value_reference,
            native_type,
            description: raw.description,
            start: attributes.start,
        })
    }
}

impl TryFrom<XmlModelDescription> for ModelDescription {
    type Error = FmuError;

    fn try_from(raw: XmlModelDescription) -> FmuResult<Self> {
        let co_simulation = raw
            .co_simulation
            .ok_or_else(|| FmuError::load("component does not support co-simulation"))?;
        let variables = raw
            .model_variables
            .variables
            .into_iter()
            .map(ScalarVariable::try_from)
            .collect::<FmuResult<Vec<_>>>()?;
        ensure_unique_names(&variables)?;
        Ok(ModelDescription {
            fmi_version: raw.fmi_version,
            model_name: raw.model_name,
            guid: raw.guid,
            description: raw.description,
            model_identifier: co_simulation.model_identifier,
            default_experiment: raw.default_experiment.map(|e| DefaultExperiment {
                start_time: e.start_time,
                stop_time: e.stop_time,
                step_size: e.step_size,
            }),
            variables,
        })
    }
}
