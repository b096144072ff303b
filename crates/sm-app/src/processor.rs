//! Discovery of simulation models in a submodel and registration of their
//! operations.

use crate::config::ProcessorConfig;
use crate::error::{AppError, AppResult};
use crate::host::{FileLocator, FileStore, OperationHandler, OperationRegistry};
use crate::operations::{self, ModelContext};
use crate::signature;
use sm_core::Timer;
use sm_fmu::{load_component, BackendRegistry, ComponentDescriptor};
use sm_model::{
    parse_properties, ElementKind, IdShortPath, ModelError, Operation, Reference, SemanticIdPath,
    Submodel, SubmodelElement,
};
use sm_sim::{ComponentStore, InstanceRegistry};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SEMANTIC_ID_SIMULATION_MODELS: &str =
    "https://admin-shell.io/idta/SimulationModels/SimulationModels/1/0";
pub const SEMANTIC_ID_SIMULATION_MODEL: &str =
    "https://admin-shell.io/idta/SimulationModels/SimulationModel/1/0";
pub const SEMANTIC_ID_MODEL_FILE: &str =
    "https://admin-shell.io/idta/SimulationModels/ModelFile/1/0";
pub const SEMANTIC_ID_MODEL_FILE_VERSION: &str =
    "https://admin-shell.io/idta/SimulationModels/ModelFileVersion/1/0";
pub const SEMANTIC_ID_DIGITAL_FILE: &str =
    "https://admin-shell.io/idta/SimulationModels/DigitalFile/1/0";
pub const SEMANTIC_ID_PARAM_FILE: &str =
    "https://admin-shell.io/idta/SimulationModels/ParamFile/1/0";

fn model_file_path() -> SemanticIdPath {
    SemanticIdPath::builder()
        .semantic_id(Reference::global(SEMANTIC_ID_SIMULATION_MODEL))
        .semantic_id(Reference::global(SEMANTIC_ID_MODEL_FILE))
        .semantic_id(Reference::global(SEMANTIC_ID_MODEL_FILE_VERSION))
        .semantic_id(Reference::global(SEMANTIC_ID_DIGITAL_FILE))
}

fn param_file_path() -> SemanticIdPath {
    SemanticIdPath::builder()
        .semantic_id(Reference::global(SEMANTIC_ID_SIMULATION_MODEL))
        .semantic_id(Reference::global(SEMANTIC_ID_PARAM_FILE))
}

/// Turns simulation-model submodels into callable operations.
pub struct SimulationProcessor {
    config: ProcessorConfig,
    backends: BackendRegistry,
    files: Arc<dyn FileStore>,
    operations: Arc<dyn OperationRegistry>,
    components: Arc<ComponentStore>,
    instances: Arc<InstanceRegistry>,
}

impl SimulationProcessor {
    pub fn new(
        config: ProcessorConfig,
        backends: BackendRegistry,
        files: Arc<dyn FileStore>,
        operations: Arc<dyn OperationRegistry>,
    ) -> Self {
        Self {
            config,
            backends,
            files,
            operations,
            components: Arc::new(ComponentStore::new()),
            instances: Arc::new(InstanceRegistry::new()),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    /// True iff the submodel is tagged as a simulation-models submodel.
    pub fn accept(&self, submodel: &Submodel) -> bool {
        submodel
            .semantic_id
            .as_ref()
            .is_some_and(|id| id.semantically_equals(&Reference::global(SEMANTIC_ID_SIMULATION_MODELS)))
    }

    /// Load every model collection and register its operations.
    ///
    /// A model that fails to load is logged and skipped. Returns whether any
    /// operation element was added to the submodel.
    pub fn process(&self, submodel: &mut Submodel) -> bool {
        let timer = Timer::start("process submodel");
        let collections: Vec<usize> = submodel
            .submodel_elements
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, SubmodelElement::SubmodelElementCollection(_)))
            .map(|(i, _)| i)
            .collect();
        tracing::debug!(
            "Found {} simulation model collections for submodel (idShort: {}, id: {})",
            collections.len(),
            submodel.id_short.as_deref().unwrap_or(""),
            submodel.id
        );

        let mut modified = false;
        for index in collections {
            match self.process_model(submodel, index) {
                Ok(added) => modified |= added,
                Err(e) => tracing::warn!(
                    "Error loading simulation model {} (submodel: {}): {e}",
                    submodel.submodel_elements[index].id_short().unwrap_or("?"),
                    submodel.id
                ),
            }
        }
        timer.stop();
        modified
    }

    fn process_model(&self, submodel: &mut Submodel, index: usize) -> AppResult<bool> {
        let element = &submodel.submodel_elements[index];
        let id_short = element
            .id_short()
            .ok_or_else(|| AppError::Model("model collection has no idShort".to_string()))?
            .to_string();
        let name = self.config.model_name(&id_short);
        let key = Reference::for_submodel(&submodel.id, [id_short.as_str()]);

        let descriptor = self.component(submodel, index, &name, &key)?;
        let parameters = self.parameters(submodel, index)?;
        tracing::info!(model = %name, component = %descriptor.digest(), parameters = parameters.len(), "simulation model loaded");

        let model = Arc::new(ModelContext::new(&name, descriptor, parameters, &self.config));
        let description = model.descriptor.description();

        let mut added = self.install(
            submodel,
            signature::run_operation(&name, description, self.config.results_per_step)?,
            operations::run_handler(Arc::clone(&model)),
        );
        if self.config.explicit_lifecycle {
            added |= self.install(
                submodel,
                signature::create_instance_operation(&name, description)?,
                operations::create_instance_handler(Arc::clone(&model), Arc::clone(&self.instances)),
            );
            added |= self.install(
                submodel,
                signature::do_step_operation(&name, description, self.config.results_per_step)?,
                operations::do_step_handler(Arc::clone(&model), Arc::clone(&self.instances)),
            );
            added |= self.install(
                submodel,
                signature::destroy_instance_operation(&name),
                operations::destroy_instance_handler(Arc::clone(&model), Arc::clone(&self.instances)),
            );
        }
        Ok(added)
    }

    fn component(
        &self,
        submodel: &Submodel,
        index: usize,
        name: &str,
        key: &Reference,
    ) -> AppResult<Arc<ComponentDescriptor>> {
        let cache_key = key.to_string();
        if let Some(descriptor) = self
            .components
            .lookup(&cache_key)
            .and_then(|id| self.components.get(id))
        {
            return Ok(descriptor);
        }
        let locator = self
            .locate(submodel, index, &model_file_path())?
            .ok_or_else(|| AppError::Model(format!("no model file for {name}")))?;
        let bytes = self.files.fetch(&locator)?;
        let (_, descriptor) = self
            .components
            .get_or_load(&cache_key, || load_component(name, &bytes, &self.backends))?;
        Ok(descriptor)
    }

    fn parameters(&self, submodel: &Submodel, index: usize) -> AppResult<BTreeMap<String, String>> {
        let Some(locator) = self.locate(submodel, index, &param_file_path())? else {
            return Ok(BTreeMap::new());
        };
        let bytes = self.files.fetch(&locator)?;
        Ok(parse_properties(&String::from_utf8_lossy(&bytes)))
    }

    /// File element matched by `path` below the model collection, if any.
    fn locate(
        &self,
        submodel: &Submodel,
        index: usize,
        path: &SemanticIdPath,
    ) -> AppResult<Option<FileLocator>> {
        let elements = std::slice::from_ref(&submodel.submodel_elements[index]);
        let resolved = match path.resolve_unique(&IdShortPath::new(), elements, ElementKind::File) {
            Ok(resolved) => resolved,
            Err(ModelError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let SubmodelElement::File(file) = resolved.element else {
            return Ok(None);
        };
        let value = file
            .value
            .clone()
            .ok_or_else(|| AppError::Model(format!("file element {} has no value", resolved.path)))?;
        Ok(Some(FileLocator {
            submodel_id: submodel.id.clone(),
            path: resolved.path.to_string(),
            value,
        }))
    }

    /// Register `handler` for the operation, adding the operation element
    /// unless one with the same idShort already exists.
    fn install(&self, submodel: &mut Submodel, operation: Operation, handler: OperationHandler) -> bool {
        let reference = Reference::for_submodel(&submodel.id, [operation.id_short.as_str()]);
        let added = if submodel.operation(&operation.id_short).is_some() {
            tracing::debug!(operation = %operation.id_short, "reusing existing operation");
            false
        } else {
            submodel
                .submodel_elements
                .push(SubmodelElement::Operation(operation));
            true
        };
        self.operations.register_operation(reference, handler);
        added
    }
}
