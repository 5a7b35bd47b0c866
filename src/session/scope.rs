// Mon Feb 9 2026 - Alex

use super::{DebugSession, SessionResult, StackFrame};

/// Switches the session scope to `frame`, runs `body`, and restores the
/// previous scope on every exit path. Scope is process-wide mutable state
/// observed by unrelated callers, so the restore happens whether the body
/// succeeds, finds nothing, or fails; the body's error wins over a restore
/// failure.
pub fn with_scope<T>(
    session: &mut dyn DebugSession,
    frame: &StackFrame,
    body: impl FnOnce(&mut dyn DebugSession) -> SessionResult<T>,
) -> SessionResult<T> {
    let previous = session.current_scope()?;
    session.set_scope(frame)?;
    let outcome = body(session);
    let restored = session.set_scope(&previous);
    match outcome {
        Ok(value) => restored.map(|_| value),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{LocalSymbol, SessionError};

    /// Records every scope transition so tests can assert the restore
    /// discipline.
    struct ScopeTrackingSession {
        scope: StackFrame,
        transitions: Vec<StackFrame>,
    }

    impl ScopeTrackingSession {
        fn new(initial: StackFrame) -> Self {
            Self {
                scope: initial,
                transitions: Vec::new(),
            }
        }
    }

    impl DebugSession for ScopeTrackingSession {
        fn module_base(&mut self, _module: &str) -> SessionResult<u64> {
            unreachable!()
        }
        fn module_name(&mut self, _module_base: u64) -> SessionResult<String> {
            unreachable!()
        }
        fn type_id(&mut self, _module_base: u64, _type_name: &str) -> SessionResult<u32> {
            unreachable!()
        }
        fn type_size(&mut self, _module_base: u64, _type_id: u32) -> SessionResult<u32> {
            unreachable!()
        }
        fn field_type_and_offset(
            &mut self,
            _module_base: u64,
            _type_id: u32,
            _field_name: &str,
        ) -> SessionResult<(u32, u32)> {
            unreachable!()
        }
        fn type_name(&mut self, _module_base: u64, _type_id: u32) -> SessionResult<String> {
            unreachable!()
        }
        fn symbol_name(&mut self, _address: u64) -> SessionResult<(String, u64)> {
            unreachable!()
        }
        fn symbol_type_id(&mut self, _qualified_name: &str) -> SessionResult<(u32, u64)> {
            unreachable!()
        }
        fn offset_by_name(&mut self, _name: &str) -> SessionResult<u64> {
            unreachable!()
        }
        fn execute(&mut self, _command: &str, _sink: &mut dyn FnMut(&str)) -> SessionResult<()> {
            unreachable!()
        }
        fn wait_for_break(&mut self) -> SessionResult<()> {
            unreachable!()
        }
        fn current_scope(&mut self) -> SessionResult<StackFrame> {
            Ok(self.scope)
        }
        fn set_scope(&mut self, frame: &StackFrame) -> SessionResult<()> {
            self.scope = *frame;
            self.transitions.push(*frame);
            Ok(())
        }
        fn stack_frames(&mut self, _max_frames: usize) -> SessionResult<Vec<StackFrame>> {
            unreachable!()
        }
        fn scope_symbols(&mut self) -> SessionResult<Vec<LocalSymbol>> {
            unreachable!()
        }
    }

    fn frame(instruction_address: u64) -> StackFrame {
        StackFrame {
            frame_address: instruction_address + 0x100,
            stack_address: instruction_address + 0x200,
            instruction_address,
        }
    }

    #[test]
    fn restores_scope_after_success() {
        let original = frame(0x1000);
        let target = frame(0x2000);
        let mut session = ScopeTrackingSession::new(original);

        let seen = with_scope(&mut session, &target, |session| session.current_scope()).unwrap();

        assert_eq!(seen, target);
        assert_eq!(session.scope, original);
        assert_eq!(session.transitions, vec![target, original]);
    }

    #[test]
    fn restores_scope_when_body_fails() {
        let original = frame(0x1000);
        let target = frame(0x2000);
        let mut session = ScopeTrackingSession::new(original);

        let result: SessionResult<()> = with_scope(&mut session, &target, |_| {
            Err(SessionError::Failed("boom".to_string()))
        });

        assert!(matches!(result, Err(SessionError::Failed(_))));
        assert_eq!(session.scope, original);
        assert_eq!(session.transitions, vec![target, original]);
    }
}
