//! Structural validation of twin models.

use crate::schema::{Environment, Operation, Submodel, SubmodelElement};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Empty identifier in {context}")]
    EmptyId { context: String },
}

pub fn validate_environment(environment: &Environment) -> Result<(), ValidationError> {
    let mut ids = HashSet::new();
    for submodel in &environment.submodels {
        if !ids.insert(submodel.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: submodel.id.clone(),
                context: "submodels".to_string(),
            });
        }
        validate_submodel(submodel)?;
    }
    Ok(())
}

pub fn validate_submodel(submodel: &Submodel) -> Result<(), ValidationError> {
    if submodel.id.trim().is_empty() {
        return Err(ValidationError::EmptyId {
            context: "submodel id".to_string(),
        });
    }
    validate_siblings(&submodel.submodel_elements, &submodel.id, false)
}

fn validate_siblings(
    elements: &[SubmodelElement],
    context: &str,
    in_list: bool,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for element in elements {
        // list entries are addressed by index, so their idShorts may repeat
        if !in_list {
            if let Some(id_short) = element.id_short() {
                if id_short.trim().is_empty() {
                    return Err(ValidationError::EmptyId {
                        context: context.to_string(),
                    });
                }
                if !seen.insert(id_short) {
                    return Err(ValidationError::DuplicateId {
                        id: id_short.to_string(),
                        context: context.to_string(),
                    });
                }
            }
        }
        let child_context = format!("{}/{}", context, element.id_short().unwrap_or("?"));
        match element {
            SubmodelElement::SubmodelElementCollection(c) => {
                validate_siblings(&c.value, &child_context, false)?
            }
            SubmodelElement::SubmodelElementList(l) => {
                validate_siblings(&l.value, &child_context, true)?
            }
            SubmodelElement::Operation(op) => validate_operation(op, &child_context)?,
            SubmodelElement::Property(_) | SubmodelElement::File(_) => {}
        }
    }
    Ok(())
}

fn validate_operation(op: &Operation, context: &str) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for variable in op
        .input_variables
        .iter()
        .chain(&op.output_variables)
        .chain(&op.inoutput_variables)
    {
        if let Some(id_short) = variable.value.id_short() {
            if !seen.insert(id_short) {
                return Err(ValidationError::DuplicateId {
                    id: id_short.to_string(),
                    context: format!("{context} variables"),
                });
            }
        }
    }
    Ok(())
}
