//! References: global semantic identifiers and model-internal element paths.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    ExternalReference,
    ModelReference,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum KeyType {
    GlobalReference,
    Submodel,
    SubmodelElement,
    SubmodelElementCollection,
    SubmodelElementList,
    Property,
    File,
    Operation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Key {
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Reference {
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub keys: Vec<Key>,
}

impl Reference {
    /// External reference consisting of a single global IRI.
    pub fn global(iri: impl Into<String>) -> Self {
        Self {
            kind: ReferenceKind::ExternalReference,
            keys: vec![Key {
                key_type: KeyType::GlobalReference,
                value: iri.into(),
            }],
        }
    }

    /// Model reference to an element below a submodel, given the idShort chain.
    pub fn for_submodel<I, S>(submodel_id: &str, id_shorts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys = vec![Key {
            key_type: KeyType::Submodel,
            value: submodel_id.to_string(),
        }];
        keys.extend(id_shorts.into_iter().map(|s| Key {
            key_type: KeyType::SubmodelElement,
            value: s.into(),
        }));
        Self {
            kind: ReferenceKind::ModelReference,
            keys,
        }
    }

    /// Compare key values only, ignoring reference and key types.
    pub fn semantically_equals(&self, other: &Reference) -> bool {
        self.keys.len() == other.keys.len()
            && self
                .keys
                .iter()
                .zip(&other.keys)
                .all(|(a, b)| a.value == b.value)
    }

    /// Value of the first key of the given type.
    pub fn first_key_of(&self, key_type: KeyType) -> Option<&str> {
        self.keys
            .iter()
            .find(|k| k.key_type == key_type)
            .map(|k| k.value.as_str())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.keys.iter().map(|k| k.value.as_str()).collect();
        write!(f, "{}", parts.join("/"))
    }
}
