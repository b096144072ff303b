//! Extraction of invocation arguments.
//!
//! Arguments are matched by idShort. Required arguments are checked before
//! any native call is made.

use crate::error::{AppError, AppResult};
use crate::signature::{
    ARG_ARGS_PER_STEP, ARG_CURRENT_TIME, ARG_INSTANCE_NAME, ARG_STEP_COUNT, ARG_STEP_NUMBER,
    ARG_TIME_STEP,
};
use sm_model::{DataType, OperationVariable, SubmodelElement, TypedValue};
use sm_sim::StepInputs;
use std::collections::BTreeMap;
use std::str::FromStr;

fn find<'a>(arguments: &'a [OperationVariable], name: &str) -> Option<&'a str> {
    arguments
        .iter()
        .filter_map(|a| a.value.as_property())
        .find(|p| p.id_short == name)
        .map(|p| p.value.as_deref().unwrap_or(""))
}

pub fn require_argument<'a>(
    arguments: &'a [OperationVariable],
    name: &str,
    data_type: DataType,
) -> AppResult<&'a str> {
    find(arguments, name).ok_or_else(|| AppError::MissingRequiredArgument {
        name: name.to_string(),
        data_type,
    })
}

pub fn optional_argument<'a>(arguments: &'a [OperationVariable], name: &str) -> Option<&'a str> {
    find(arguments, name)
}

fn parse<T>(name: &str, raw: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| AppError::invalid(name, format!("'{raw}': {e}")))
}

/// Step inputs from the `argumentsPerStep` list, if present.
///
/// Each bundle must carry a `stepNumber`; its other properties become the
/// inputs for that step. A repeated step number replaces the earlier bundle.
pub fn step_inputs(arguments: &[OperationVariable]) -> AppResult<StepInputs> {
    let mut inputs = StepInputs::new();
    let bundles = arguments.iter().find_map(|a| match &a.value {
        SubmodelElement::SubmodelElementList(list) if list.id_short == ARG_ARGS_PER_STEP => {
            Some(&list.value)
        }
        _ => None,
    });
    let Some(bundles) = bundles else {
        return Ok(inputs);
    };

    for bundle in bundles {
        let SubmodelElement::SubmodelElementCollection(collection) = bundle else {
            continue;
        };
        let properties: Vec<_> = collection
            .value
            .iter()
            .filter_map(SubmodelElement::as_property)
            .collect();
        let step = properties
            .iter()
            .find(|p| p.id_short == ARG_STEP_NUMBER)
            .ok_or_else(|| {
                AppError::invalid(ARG_ARGS_PER_STEP, format!("bundle missing argument {ARG_STEP_NUMBER}"))
            })?;
        let step: i64 = parse(ARG_STEP_NUMBER, step.value.as_deref().unwrap_or(""))?;
        let Ok(step) = u32::try_from(step) else {
            tracing::debug!(step, "ignoring inputs for out-of-range step");
            continue;
        };
        let values = properties
            .into_iter()
            .filter(|p| p.id_short != ARG_STEP_NUMBER)
            .map(TypedValue::from_property)
            .collect();
        inputs.insert(step, values);
    }
    Ok(inputs)
}

/// Arguments shared by the run and step operations.
#[derive(Debug, Clone, PartialEq)]
pub struct StepArguments {
    pub current_time: Option<f64>,
    pub time_step: f64,
    pub step_count: u32,
    pub inputs: StepInputs,
}

impl StepArguments {
    /// `currentTime` is looked up in the inputs first, then in the inoutputs.
    pub fn parse(input: &[OperationVariable], inoutput: &[OperationVariable]) -> AppResult<Self> {
        let step_count = parse(
            ARG_STEP_COUNT,
            require_argument(input, ARG_STEP_COUNT, DataType::Integer)?,
        )?;
        let time_step = parse(
            ARG_TIME_STEP,
            require_argument(input, ARG_TIME_STEP, DataType::Double)?,
        )?;
        let current_time = optional_argument(input, ARG_CURRENT_TIME)
            .or_else(|| optional_argument(inoutput, ARG_CURRENT_TIME))
            .map(|raw| parse(ARG_CURRENT_TIME, raw))
            .transpose()?;
        Ok(Self {
            current_time,
            time_step,
            step_count,
            inputs: step_inputs(input)?,
        })
    }
}

pub fn instance_name(input: &[OperationVariable]) -> AppResult<&str> {
    require_argument(input, ARG_INSTANCE_NAME, DataType::String)
}

/// Every property argument as a name/value override.
pub fn parameter_overrides(input: &[OperationVariable]) -> BTreeMap<String, String> {
    input
        .iter()
        .filter_map(|a| a.value.as_property())
        .filter_map(|p| Some((p.id_short.clone(), p.value.clone()?)))
        .collect()
}
