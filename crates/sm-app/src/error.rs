//! Error types for the sm-app service layer.

use sm_model::DataType;
use std::path::PathBuf;

/// Application error type covering invocation, configuration and host
/// failures, and wrapping the lower layers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing required argument (name: {name}, datatype: {data_type})")]
    MissingRequiredArgument { name: String, data_type: DataType },

    #[error("Invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("File not found: {locator}")]
    FileNotFound { locator: String },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Sim(#[from] sm_sim::SimError),
}

/// Result type for sm-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub(crate) fn invalid(name: &str, message: impl Into<String>) -> Self {
        AppError::InvalidArgument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

impl From<sm_fmu::FmuError> for AppError {
    fn from(err: sm_fmu::FmuError) -> Self {
        AppError::Sim(sm_sim::SimError::Fmu(err))
    }
}

impl From<sm_model::ModelError> for AppError {
    fn from(err: sm_model::ModelError) -> Self {
        AppError::Model(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
