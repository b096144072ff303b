use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the shared foundation types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },
}
