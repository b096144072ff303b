//! sm-fmu: co-simulation components.
//!
//! Contains:
//! - description / directory (model description parsing and variable queries)
//! - bridge (native value <-> string-encoded model value)
//! - status (status interpretation and pending-call polling)
//! - slave (backend traits and registry)
//! - package (component loading)
//! - instance (instance lifecycle)
//! - bouncing_ball (bundled reference backend)

pub mod bouncing_ball;
pub mod bridge;
pub mod description;
pub mod directory;
pub mod error;
pub mod instance;
pub mod package;
pub mod slave;
pub mod status;
pub mod types;

pub use description::{DefaultExperiment, ModelDescription, ScalarVariable};
pub use error::{FmuError, FmuResult};
pub use instance::Instance;
pub use package::{
    build_package, load_component, load_component_anonymous, read_model_description,
    ComponentDescriptor, MODEL_DESCRIPTION_ENTRY,
};
pub use slave::{BackendRegistry, Slave, SlaveFactory};
pub use status::{poll_until, CallKind, PendingPolicy, Status, StatusGovernor};
pub use types::{Causality, NativeType, NativeValue, ValueReference, Variability};
