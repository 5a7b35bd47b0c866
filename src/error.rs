// Mon Feb 9 2026 - Alex

use thiserror::Error;

/// Failure taxonomy surfaced to callers. Every variant carries a full
/// message naming the module/type/symbol that failed; partial results are
/// never returned alongside one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0}")]
    UnknownModule(String),
    #[error("{0}")]
    UnknownType(String),
    #[error("{0}")]
    InvalidSymbol(String),
    #[error("{0}")]
    InternalInconsistency(String),
    #[error("{0}")]
    DebuggerOperationFailed(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
