//! Error types for component loading and native calls.

use crate::status::Status;
use crate::types::{Causality, NativeType};
use std::time::Duration;
use thiserror::Error;

/// Result type for component operations.
pub type FmuResult<T> = Result<T, FmuError>;

/// Errors raised while loading components or talking to running instances.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FmuError {
    /// The component package could not be read, parsed or instantiated.
    #[error("Failed to load component: {message}")]
    LoadFailure { message: String },

    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("Variable {name} is not writable (causality: {causality})")]
    NotWritable { name: String, causality: Causality },

    #[error("Unsupported native type: {native_type}")]
    UnsupportedType { native_type: NativeType },

    /// A string could not be converted to the variable's native type.
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Received status '{status}' - {context}")]
    NativeCallFailed { status: Status, context: String },

    #[error("Call still pending after {waited:?} - {context}")]
    PendingTimeout { context: String, waited: Duration },
}

impl FmuError {
    pub(crate) fn load(message: impl Into<String>) -> Self {
        FmuError::LoadFailure {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FmuError::NativeCallFailed {
            status: Status::Discard,
            context: "doStep".into(),
        };
        assert_eq!(err.to_string(), "Received status 'Discard' - doStep");

        let err = FmuError::UnsupportedType {
            native_type: NativeType::Enumeration,
        };
        assert!(err.to_string().contains("Enumeration"));
    }
}
