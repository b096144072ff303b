//! Service layer connecting co-simulation components to a twin model.
//!
//! This crate discovers simulation models in a submodel, loads their
//! components, derives operation signatures and registers the handlers that
//! run them. Host services (file retrieval and operation registration) are
//! reached through the traits in [`host`].

pub mod arguments;
pub mod config;
pub mod error;
pub mod host;
pub mod operations;
pub mod processor;
pub mod signature;

pub use config::{load_config, ProcessorConfig};
pub use error::{AppError, AppResult};
pub use host::{
    DirectoryFileStore, FileLocator, FileStore, InMemoryFileStore, InMemoryOperations,
    OperationHandler, OperationRegistry,
};
pub use operations::ModelContext;
pub use processor::{
    SimulationProcessor, SEMANTIC_ID_DIGITAL_FILE, SEMANTIC_ID_MODEL_FILE,
    SEMANTIC_ID_MODEL_FILE_VERSION, SEMANTIC_ID_PARAM_FILE, SEMANTIC_ID_SIMULATION_MODEL,
    SEMANTIC_ID_SIMULATION_MODELS,
};
