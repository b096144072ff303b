//! Twin model schema definitions.

use crate::reference::Reference;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    #[serde(default)]
    pub submodels: Vec<Submodel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submodel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default)]
    pub submodel_elements: Vec<SubmodelElement>,
}

impl Submodel {
    /// Top-level element with the given idShort.
    pub fn element(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.submodel_elements
            .iter()
            .find(|e| e.id_short() == Some(id_short))
    }

    /// Top-level operation with the given idShort.
    pub fn operation(&self, id_short: &str) -> Option<&Operation> {
        self.submodel_elements.iter().find_map(|e| match e {
            SubmodelElement::Operation(op) if op.id_short == id_short => Some(op),
            _ => None,
        })
    }
}

/// Scalar value types a property can declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    #[serde(rename = "xs:boolean")]
    Boolean,
    #[serde(rename = "xs:integer")]
    Integer,
    #[serde(rename = "xs:double")]
    Double,
    #[serde(rename = "xs:string")]
    String,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Boolean => "xs:boolean",
            DataType::Integer => "xs:integer",
            DataType::Double => "xs:double",
            DataType::String => "xs:string",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LangString {
    pub language: String,
    pub text: String,
}

impl LangString {
    pub fn en(text: impl Into<String>) -> Self {
        Self {
            language: "en".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QualifierKind {
    ValueQualifier,
    ConceptQualifier,
    TemplateQualifier,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Qualifier {
    pub kind: QualifierKind,
    #[serde(rename = "type")]
    pub qualifier_type: String,
    pub value_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Qualifier {
    /// Template qualifier declaring that a list element may occur any number of times.
    pub fn zero_to_many() -> Self {
        Self {
            kind: QualifierKind::TemplateQualifier,
            qualifier_type: "Cardinality".to_string(),
            value_type: DataType::String,
            value: Some("ZeroToMany".to_string()),
        }
    }
}

/// Element kinds, used as list element types and for path resolution targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Property,
    File,
    SubmodelElementCollection,
    SubmodelElementList,
    Operation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "modelType")]
pub enum SubmodelElement {
    Property(Property),
    File(File),
    SubmodelElementCollection(ElementCollection),
    SubmodelElementList(ElementList),
    Operation(Operation),
}

impl SubmodelElement {
    pub fn id_short(&self) -> Option<&str> {
        match self {
            SubmodelElement::Property(p) => Some(p.id_short.as_str()),
            SubmodelElement::File(f) => Some(f.id_short.as_str()),
            SubmodelElement::SubmodelElementCollection(c) => c.id_short.as_deref(),
            SubmodelElement::SubmodelElementList(l) => Some(l.id_short.as_str()),
            SubmodelElement::Operation(o) => Some(o.id_short.as_str()),
        }
    }

    pub fn semantic_id(&self) -> Option<&Reference> {
        match self {
            SubmodelElement::Property(p) => p.semantic_id.as_ref(),
            SubmodelElement::File(f) => f.semantic_id.as_ref(),
            SubmodelElement::SubmodelElementCollection(c) => c.semantic_id.as_ref(),
            SubmodelElement::SubmodelElementList(l) => l.semantic_id.as_ref(),
            SubmodelElement::Operation(o) => o.semantic_id.as_ref(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            SubmodelElement::Property(_) => ElementKind::Property,
            SubmodelElement::File(_) => ElementKind::File,
            SubmodelElement::SubmodelElementCollection(_) => ElementKind::SubmodelElementCollection,
            SubmodelElement::SubmodelElementList(_) => ElementKind::SubmodelElementList,
            SubmodelElement::Operation(_) => ElementKind::Operation,
        }
    }

    /// Direct children of container elements; empty for leaves.
    pub fn children(&self) -> &[SubmodelElement] {
        match self {
            SubmodelElement::SubmodelElementCollection(c) => &c.value,
            SubmodelElement::SubmodelElementList(l) => &l.value,
            _ => &[],
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match self {
            SubmodelElement::Property(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    pub value_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Property {
    pub fn new(id_short: impl Into<String>, value_type: DataType) -> Self {
        Self {
            id_short: id_short.into(),
            semantic_id: None,
            description: Vec::new(),
            value_type,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = vec![LangString::en(text)];
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Path of the file inside the host's file storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    #[serde(default)]
    pub value: Vec<SubmodelElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementList {
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_value_list_element: Option<ElementKind>,
    #[serde(default)]
    pub value: Vec<SubmodelElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationVariable {
    pub value: SubmodelElement,
}

impl OperationVariable {
    pub fn new(value: SubmodelElement) -> Self {
        Self { value }
    }
}

impl From<Property> for OperationVariable {
    fn from(p: Property) -> Self {
        Self::new(SubmodelElement::Property(p))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default)]
    pub input_variables: Vec<OperationVariable>,
    #[serde(default)]
    pub output_variables: Vec<OperationVariable>,
    #[serde(default)]
    pub inoutput_variables: Vec<OperationVariable>,
}
