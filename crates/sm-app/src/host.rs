//! Interfaces consumed from the hosting twin service, with in-memory and
//! directory-backed implementations.

use crate::error::{AppError, AppResult};
use sm_model::{OperationVariable, Reference};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Location of a file element inside a submodel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocator {
    pub submodel_id: String,
    /// idShort path of the file element
    pub path: String,
    /// value of the file element, i.e. the stored file's path
    pub value: String,
}

impl fmt::Display for FileLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.value, self.submodel_id, self.path)
    }
}

/// Retrieves file contents referenced by the model.
pub trait FileStore: Send + Sync {
    fn fetch(&self, locator: &FileLocator) -> AppResult<Vec<u8>>;
}

/// Files keyed by their stored path.
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, content: Vec<u8>) {
        lock(&self.files).insert(path.into(), content);
    }
}

impl FileStore for InMemoryFileStore {
    fn fetch(&self, locator: &FileLocator) -> AppResult<Vec<u8>> {
        lock(&self.files)
            .get(&locator.value)
            .cloned()
            .ok_or_else(|| AppError::FileNotFound {
                locator: locator.to_string(),
            })
    }
}

/// Files resolved relative to a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryFileStore {
    root: PathBuf,
}

impl DirectoryFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStore for DirectoryFileStore {
    fn fetch(&self, locator: &FileLocator) -> AppResult<Vec<u8>> {
        let relative = locator.value.trim_start_matches('/');
        let path = self.root.join(relative);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::FileNotFound {
                locator: locator.to_string(),
            },
            _ => AppError::FileRead { path, source: e },
        })
    }
}

/// Handler invoked with the input and inoutput arguments of an operation.
pub type OperationHandler = Arc<
    dyn Fn(&[OperationVariable], &[OperationVariable]) -> AppResult<Vec<OperationVariable>>
        + Send
        + Sync,
>;

/// Installs callable operations addressed by model reference.
pub trait OperationRegistry: Send + Sync {
    fn register_operation(&self, reference: Reference, handler: OperationHandler);
}

/// Registry that keeps handlers in memory and can invoke them.
#[derive(Default)]
pub struct InMemoryOperations {
    handlers: Mutex<HashMap<Reference, OperationHandler>>,
}

impl InMemoryOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invoke(
        &self,
        reference: &Reference,
        input: &[OperationVariable],
        inoutput: &[OperationVariable],
    ) -> AppResult<Vec<OperationVariable>> {
        let handler = lock(&self.handlers)
            .get(reference)
            .cloned()
            .ok_or_else(|| AppError::invalid("operation", format!("no handler for {reference}")))?;
        handler(input, inoutput)
    }

    /// Registered references, sorted by their display form.
    pub fn references(&self) -> Vec<Reference> {
        let mut refs: Vec<Reference> = lock(&self.handlers).keys().cloned().collect();
        refs.sort_by_key(|r| r.to_string());
        refs
    }
}

impl OperationRegistry for InMemoryOperations {
    fn register_operation(&self, reference: Reference, handler: OperationHandler) {
        tracing::debug!(%reference, "operation registered");
        lock(&self.handlers).insert(reference, handler);
    }
}

impl fmt::Debug for InMemoryOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryOperations")
            .field("references", &self.references())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
