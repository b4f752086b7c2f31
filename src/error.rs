use thiserror::Error;

/// Broad failure classes surfaced to the boundary layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown session, table, dataset, or column.
    NotFound,
    /// Missing required parameter, untracked commit target, unsupported
    /// kind/tag, or a closed-session precondition.
    InvalidArgument,
    /// I/O, parse, or coercion failure while running an operation.
    Execution,
}

/// Crate-wide error carrying a kind plus a human-readable message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

pub(crate) fn not_found(message: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::NotFound, message)
}

pub(crate) fn invalid_argument(message: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::InvalidArgument, message)
}

pub(crate) fn execution(message: impl Into<String>) -> EngineError {
    EngineError::new(ErrorKind::Execution, message)
}

pub(crate) fn io_error(err: std::io::Error) -> EngineError {
    EngineError::new(ErrorKind::Execution, err.to_string())
}

pub(crate) fn serde_error(err: serde_json::Error) -> EngineError {
    EngineError::new(ErrorKind::Execution, err.to_string())
}

pub(crate) fn csv_error(err: csv::Error) -> EngineError {
    EngineError::new(ErrorKind::Execution, err.to_string())
}
