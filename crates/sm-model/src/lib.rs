//! sm-model: the structured twin model consumed and extended by the
//! simulation integration layer.
//!
//! Submodels hold hierarchically nested, named elements. Properties carry a
//! string-encoded value plus a declared scalar type; operations declare their
//! input/output/inoutput variables as element templates.

pub mod path;
pub mod properties;
pub mod reference;
pub mod schema;
pub mod validate;
pub mod value;

pub use path::{IdShortPath, ResolvedElement, SemanticIdPath};
pub use properties::parse_properties;
pub use reference::{Key, KeyType, Reference, ReferenceKind};
pub use schema::*;
pub use validate::{validate_environment, validate_submodel, ValidationError};
pub use value::TypedValue;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("No element matches {what}")]
    NotFound { what: String },

    #[error("Expected exactly one element for {what}, found {count}")]
    Ambiguous { what: String, count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ModelResult<Environment> {
    let content = std::fs::read_to_string(path)?;
    let environment: Environment = serde_yaml::from_str(&content)?;
    validate_environment(&environment)?;
    Ok(environment)
}

pub fn save_yaml(path: &std::path::Path, environment: &Environment) -> ModelResult<()> {
    validate_environment(environment)?;
    let content = serde_yaml::to_string(environment)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ModelResult<Environment> {
    let content = std::fs::read_to_string(path)?;
    let environment: Environment = serde_json::from_str(&content)?;
    validate_environment(&environment)?;
    Ok(environment)
}

pub fn save_json(path: &std::path::Path, environment: &Environment) -> ModelResult<()> {
    validate_environment(environment)?;
    let content = serde_json::to_string_pretty(environment)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load an environment, picking the format from the file extension.
pub fn load_environment(path: &std::path::Path) -> ModelResult<Environment> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_yaml(path),
        _ => load_json(path),
    }
}
