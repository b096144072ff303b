//! Component packages and loaded component descriptors.
//!
//! A package is a zip archive holding `modelDescription.xml` at its root.
//! Binaries inside the archive are not executed; the backend is looked up by
//! the co-simulation model identifier.

use crate::description::ModelDescription;
use crate::error::{FmuError, FmuResult};
use crate::slave::{BackendRegistry, Slave, SlaveFactory};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

pub const MODEL_DESCRIPTION_ENTRY: &str = "modelDescription.xml";

/// An immutable loaded component.
#[derive(Clone)]
pub struct ComponentDescriptor {
    name: String,
    digest: String,
    description: ModelDescription,
    factory: Arc<dyn SlaveFactory>,
}

impl ComponentDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex SHA-256 of the package bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn description(&self) -> &ModelDescription {
        &self.description
    }

    pub(crate) fn instantiate(&self, instance_name: &str) -> FmuResult<Box<dyn Slave>> {
        self.factory.instantiate(instance_name, &self.description)
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("digest", &self.digest)
            .field("model_identifier", &self.description.model_identifier)
            .field("variables", &self.description.variables().len())
            .finish()
    }
}

/// Load a package under `name`.
pub fn load_component(
    name: &str,
    bytes: &[u8],
    backends: &BackendRegistry,
) -> FmuResult<ComponentDescriptor> {
    let description = read_model_description(bytes)?;
    let factory = backends.get(&description.model_identifier)?;
    let digest = digest_hex(bytes);
    tracing::debug!(
        name,
        model = %description.model_name,
        variables = description.variables().len(),
        "loaded component"
    );
    Ok(ComponentDescriptor {
        name: name.to_string(),
        digest,
        description,
        factory,
    })
}

/// Load a package under a generated unique name.
pub fn load_component_anonymous(
    bytes: &[u8],
    backends: &BackendRegistry,
) -> FmuResult<ComponentDescriptor> {
    load_component(&uuid::Uuid::new_v4().to_string(), bytes, backends)
}

pub fn read_model_description(bytes: &[u8]) -> FmuResult<ModelDescription> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| FmuError::load(format!("not a component package: {e}")))?;
    let mut entry = archive
        .by_name(MODEL_DESCRIPTION_ENTRY)
        .map_err(|e| FmuError::load(format!("{MODEL_DESCRIPTION_ENTRY}: {e}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| FmuError::load(format!("{MODEL_DESCRIPTION_ENTRY}: {e}")))?;
    ModelDescription::parse(&xml)
}

/// Build a package containing only the given model description.
pub fn build_package(description: &ModelDescription) -> FmuResult<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(MODEL_DESCRIPTION_ENTRY, zip::write::FileOptions::default())
        .map_err(|e| FmuError::load(e.to_string()))?;
    writer
        .write_all(description.to_xml().as_bytes())
        .map_err(|e| FmuError::load(e.to_string()))?;
    let cursor = writer.finish().map_err(|e| FmuError::load(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
