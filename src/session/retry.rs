// Mon Feb 9 2026 - Alex

use parking_lot::Mutex;

use super::{DebugSession, SessionError, SessionResult};
use crate::error::EngineError;

/// Serializes every session operation and owns the retry policy.
///
/// The debugging session has one current scope and one output buffer, so
/// only one operation may be in flight at a time. Callers block on the lock
/// in acquisition order. An operation that fails because the target was not
/// stopped gets exactly one retry, gated on observing a break-in; the lock
/// is held across both attempts and the wait, so a scope mutation inside an
/// attempt can never interleave with another caller.
pub struct SessionGate {
    session: Mutex<Box<dyn DebugSession>>,
}

impl SessionGate {
    pub fn new(session: Box<dyn DebugSession>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Runs `op` against the session. `context` becomes the error message
    /// when the operation fails for an unclassified reason or exhausts its
    /// single retry.
    pub fn attempt<T>(
        &self,
        context: &str,
        mut op: impl FnMut(&mut dyn DebugSession) -> SessionResult<T>,
    ) -> Result<T, EngineError> {
        let mut session = self.session.lock();
        match op(session.as_mut()) {
            Ok(value) => Ok(value),
            Err(SessionError::Classified(error)) => Err(error),
            Err(SessionError::Failed(reason)) => {
                log::debug!("session operation failed ({}): {}", reason, context);
                Err(EngineError::DebuggerOperationFailed(context.to_string()))
            }
            Err(SessionError::Busy(reason)) => {
                log::debug!("session busy ({}), waiting for break-in: {}", reason, context);
                if session.wait_for_break().is_err() {
                    return Err(EngineError::DebuggerOperationFailed(context.to_string()));
                }
                match op(session.as_mut()) {
                    Ok(value) => Ok(value),
                    Err(SessionError::Classified(error)) => Err(error),
                    Err(_) => Err(EngineError::DebuggerOperationFailed(context.to_string())),
                }
            }
        }
    }
}
