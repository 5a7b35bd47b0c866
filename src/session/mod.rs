// Mon Feb 9 2026 - Alex

pub mod replay;
pub mod retry;
pub mod scope;

pub use replay::{ReplaySession, SessionCapture};
pub use retry::SessionGate;
pub use scope::with_scope;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::EngineError;

/// How a single session operation failed. The retry gate treats the three
/// variants differently: `Busy` is retried once after a break-in,
/// `Classified` propagates as-is, and `Failed` is replaced by the
/// operation's error template.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session busy: {0}")]
    Busy(String),
    #[error(transparent)]
    Classified(#[from] EngineError),
    #[error("{0}")]
    Failed(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Maps a non-transient session failure to a domain error. `Busy` is left
/// alone so the retry gate still gets its one shot after the next break-in.
pub(crate) fn classify<T>(
    result: SessionResult<T>,
    error: impl FnOnce() -> EngineError,
) -> SessionResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(SessionError::Busy(reason)) => Err(SessionError::Busy(reason)),
        Err(_) => Err(SessionError::Classified(error())),
    }
}

/// One frame of the target's call stack. Doubles as the session's scope
/// handle: setting the scope to a frame makes that frame's locals visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub frame_address: u64,
    pub stack_address: u64,
    pub instruction_address: u64,
}

/// A symbol from the current scope's argument + local group. An `address`
/// of zero means the value lives in a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSymbol {
    pub name: String,
    pub module_base: u64,
    pub type_id: u32,
    pub address: u64,
}

/// The boundary to the debugging session: the structured symbol facade, the
/// textual command channel, scope control, and the break gate. The session
/// is a single mutable resource and is never safe for concurrent use; all
/// access goes through [`SessionGate`].
pub trait DebugSession: Send {
    fn module_base(&mut self, module: &str) -> SessionResult<u64>;
    fn module_name(&mut self, module_base: u64) -> SessionResult<String>;
    fn type_id(&mut self, module_base: u64, type_name: &str) -> SessionResult<u32>;
    fn type_size(&mut self, module_base: u64, type_id: u32) -> SessionResult<u32>;

    /// Resolves a field of a type to its (type id, byte offset) pair.
    fn field_type_and_offset(
        &mut self,
        module_base: u64,
        type_id: u32,
        field_name: &str,
    ) -> SessionResult<(u32, u32)>;

    fn type_name(&mut self, module_base: u64, type_id: u32) -> SessionResult<String>;

    /// Resolves an address to its (`module!name`, displacement) pair.
    fn symbol_name(&mut self, address: u64) -> SessionResult<(String, u64)>;

    /// Resolves a qualified `module!symbol` name to its (type id, module
    /// base) pair.
    fn symbol_type_id(&mut self, qualified_name: &str) -> SessionResult<(u32, u64)>;

    /// Resolves a symbol name to an address. For register-resident locals
    /// in the current scope this yields the register's value instead.
    fn offset_by_name(&mut self, name: &str) -> SessionResult<u64>;

    /// Executes one textual command with `sink` attached as the output
    /// capture for exactly the duration of the call. A failure mid-command
    /// cannot leave the sink attached to later output.
    fn execute(&mut self, command: &str, sink: &mut dyn FnMut(&str)) -> SessionResult<()>;

    /// Blocks until the target reaches a break (stopped) state. There is no
    /// timeout; the retry gate's two-attempt cap is the only bound.
    fn wait_for_break(&mut self) -> SessionResult<()>;

    fn current_scope(&mut self) -> SessionResult<StackFrame>;
    fn set_scope(&mut self, frame: &StackFrame) -> SessionResult<()>;

    fn stack_frames(&mut self, max_frames: usize) -> SessionResult<Vec<StackFrame>>;

    /// Argument + local symbols visible in the current scope.
    fn scope_symbols(&mut self) -> SessionResult<Vec<LocalSymbol>>;
}
