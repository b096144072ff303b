//! sm-core: shared foundation for the simulation-model integration crates.
//!
//! Contains:
//! - ids (stable arena handles for loaded components)
//! - timing (wall-clock timer that reports through tracing)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod timing;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use timing::Timer;
