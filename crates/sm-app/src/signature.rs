//! Argument and result shapes of the derived simulation operations.

use sm_fmu::{bridge, FmuResult, ModelDescription, ScalarVariable};
use sm_model::{
    DataType, ElementCollection, ElementKind, ElementList, LangString, Operation,
    OperationVariable, Property, Qualifier, SubmodelElement, TypedValue,
};
use sm_sim::StepRecord;

pub const ARG_INSTANCE_NAME: &str = "instanceName";
pub const ARG_CURRENT_TIME: &str = "currentTime";
pub const ARG_TIME_STEP: &str = "timeStep";
pub const ARG_STEP_NUMBER: &str = "stepNumber";
pub const ARG_STEP_COUNT: &str = "stepCount";
pub const ARG_ARGS_PER_STEP: &str = "argumentsPerStep";
pub const ARG_RESULT_PER_STEP: &str = "resultPerStep";

fn argument(id_short: &str, value_type: DataType, description: &str) -> OperationVariable {
    Property::new(id_short, value_type)
        .with_description(description)
        .into()
}

pub fn instance_name_arg() -> OperationVariable {
    argument(ARG_INSTANCE_NAME, DataType::String, "name of the instance")
}

pub fn current_time_arg() -> OperationVariable {
    argument(
        ARG_CURRENT_TIME,
        DataType::Double,
        "simulated time at the start of the first step",
    )
}

pub fn time_step_arg() -> OperationVariable {
    argument(ARG_TIME_STEP, DataType::Double, "time step size")
}

pub fn step_count_arg() -> OperationVariable {
    argument(ARG_STEP_COUNT, DataType::Integer, "number of steps to execute")
}

pub fn instance_name_value(name: &str) -> OperationVariable {
    Property::new(ARG_INSTANCE_NAME, DataType::String)
        .with_value(name)
        .into()
}

fn step_number(value: Option<u32>) -> SubmodelElement {
    let property = Property::new(ARG_STEP_NUMBER, DataType::Integer);
    SubmodelElement::Property(match value {
        Some(step) => property.with_value(step.to_string()),
        None => property,
    })
}

/// Declared variable as a typed property, carrying its start value.
pub fn variable_property(variable: &ScalarVariable) -> FmuResult<Property> {
    let mut property = Property::new(&variable.name, bridge::model_type(variable.native_type)?);
    if let Some(description) = &variable.description {
        property.description = vec![LangString::en(description)];
    }
    property.value = variable.start.clone();
    Ok(property)
}

pub fn variable_properties(variables: &[&ScalarVariable]) -> FmuResult<Vec<Property>> {
    variables.iter().map(|v| variable_property(v)).collect()
}

fn step_bundle_list(
    id_short: &str,
    fields: Vec<Property>,
    qualifiers: Vec<Qualifier>,
) -> OperationVariable {
    let template = ElementCollection {
        qualifiers,
        value: std::iter::once(step_number(None))
            .chain(fields.into_iter().map(SubmodelElement::Property))
            .collect(),
        ..ElementCollection::default()
    };
    OperationVariable::new(SubmodelElement::SubmodelElementList(ElementList {
        id_short: id_short.to_string(),
        semantic_id: None,
        type_value_list_element: Some(ElementKind::SubmodelElementCollection),
        value: vec![SubmodelElement::SubmodelElementCollection(template)],
    }))
}

/// `argumentsPerStep`: any number of bundles of a step number plus one field
/// per true input.
pub fn arguments_per_step(inputs: Vec<Property>) -> OperationVariable {
    step_bundle_list(ARG_ARGS_PER_STEP, inputs, vec![Qualifier::zero_to_many()])
}

/// `resultPerStep` template with one field per output.
pub fn result_per_step(outputs: Vec<Property>) -> OperationVariable {
    step_bundle_list(ARG_RESULT_PER_STEP, outputs, Vec::new())
}

fn plain(properties: Vec<Property>) -> Vec<OperationVariable> {
    properties.into_iter().map(OperationVariable::from).collect()
}

fn result_signature(description: &ModelDescription, results_per_step: bool) -> FmuResult<Vec<OperationVariable>> {
    let outputs = variable_properties(&description.outputs())?;
    Ok(if results_per_step {
        vec![result_per_step(outputs)]
    } else {
        plain(outputs)
    })
}

/// Run-to-completion operation named after the model.
pub fn run_operation(
    name: &str,
    description: &ModelDescription,
    results_per_step: bool,
) -> FmuResult<Operation> {
    let inputs = variable_properties(&description.inputs())?;
    Ok(Operation {
        id_short: name.to_string(),
        semantic_id: None,
        description: vec![LangString::en(format!("run a simulation of {name}"))],
        input_variables: vec![
            current_time_arg(),
            time_step_arg(),
            step_count_arg(),
            arguments_per_step(inputs),
        ],
        output_variables: result_signature(description, results_per_step)?,
        // inout channels are neither written nor read by a run
        inoutput_variables: Vec::new(),
    })
}

pub fn create_instance_operation(name: &str, description: &ModelDescription) -> FmuResult<Operation> {
    Ok(Operation {
        id_short: format!("{name}-CreateInstance"),
        semantic_id: None,
        description: vec![LangString::en("create a new instance")],
        input_variables: plain(variable_properties(&description.initial_parameters())?),
        output_variables: vec![instance_name_arg()],
        inoutput_variables: Vec::new(),
    })
}

pub fn do_step_operation(
    name: &str,
    description: &ModelDescription,
    results_per_step: bool,
) -> FmuResult<Operation> {
    let inputs = variable_properties(&description.inputs())?;
    Ok(Operation {
        id_short: format!("{name}-DoStep"),
        semantic_id: None,
        description: vec![LangString::en("advance a live instance")],
        input_variables: vec![
            instance_name_arg(),
            current_time_arg(),
            time_step_arg(),
            step_count_arg(),
            arguments_per_step(inputs),
        ],
        output_variables: result_signature(description, results_per_step)?,
        inoutput_variables: Vec::new(),
    })
}

pub fn destroy_instance_operation(name: &str) -> Operation {
    Operation {
        id_short: format!("{name}-DestroyInstance"),
        semantic_id: None,
        description: vec![LangString::en("destroy an instance")],
        input_variables: vec![instance_name_arg()],
        output_variables: Vec::new(),
        inoutput_variables: Vec::new(),
    }
}

/// Step records as a filled `resultPerStep` list.
pub fn step_results(records: &[StepRecord]) -> OperationVariable {
    let bundles = records
        .iter()
        .map(|record| {
            SubmodelElement::SubmodelElementCollection(ElementCollection {
                value: std::iter::once(step_number(Some(record.step)))
                    .chain(record.values.iter().map(TypedValue::to_element))
                    .collect(),
                ..ElementCollection::default()
            })
        })
        .collect();
    OperationVariable::new(SubmodelElement::SubmodelElementList(ElementList {
        id_short: ARG_RESULT_PER_STEP.to_string(),
        semantic_id: None,
        type_value_list_element: Some(ElementKind::SubmodelElementCollection),
        value: bundles,
    }))
}

/// Typed values as plain output arguments.
pub fn value_arguments(values: &[TypedValue]) -> Vec<OperationVariable> {
    values.iter().cloned().map(OperationVariable::from).collect()
}
