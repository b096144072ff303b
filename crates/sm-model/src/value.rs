use crate::schema::{DataType, OperationVariable, Property, SubmodelElement};
use serde::{Deserialize, Serialize};

/// One variable's current value as exchanged with the model layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedValue {
    pub name: String,
    pub value_type: DataType,
    pub value: String,
}

impl TypedValue {
    pub fn new(name: impl Into<String>, value_type: DataType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type,
            value: value.into(),
        }
    }

    /// Read a property; a missing value becomes the empty string.
    pub fn from_property(property: &Property) -> Self {
        Self {
            name: property.id_short.clone(),
            value_type: property.value_type,
            value: property.value.clone().unwrap_or_default(),
        }
    }

    pub fn to_property(&self) -> Property {
        Property::new(self.name.clone(), self.value_type).with_value(self.value.clone())
    }

    pub fn to_element(&self) -> SubmodelElement {
        SubmodelElement::Property(self.to_property())
    }
}

impl From<TypedValue> for OperationVariable {
    fn from(v: TypedValue) -> Self {
        OperationVariable::from(v.to_property())
    }
}
