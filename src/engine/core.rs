// Wed Feb 11 2026 - Alex

use std::io;
use std::path::Path;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::session::{DebugSession, ReplaySession, SessionGate, StackFrame};
use crate::structure::builder::TypeBuilder;
use crate::structure::model::{SymbolName, SymbolResult, Type};
use crate::symbol::SymbolResolver;

/// Facade over one debugging session: type graph lookups, global and local
/// symbol resolution, and address-to-name queries, all serialized and
/// retried through the session gate.
pub struct DebuggerEngine {
    gate: SessionGate,
    config: EngineConfig,
}

impl DebuggerEngine {
    pub fn new(session: Box<dyn DebugSession>, config: EngineConfig) -> Self {
        Self {
            gate: SessionGate::new(session),
            config,
        }
    }

    /// Opens an engine over a frozen session capture file.
    pub fn from_capture_file(path: &Path, config: EngineConfig) -> io::Result<Self> {
        let session = ReplaySession::from_file(path)?;
        Ok(Self::new(Box::new(session), config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the canonical type for `module!type_name`: dump, reconcile,
    /// partition into base classes.
    pub fn get_type(&self, module: &str, type_name: &str) -> Result<Type, EngineError> {
        TypeBuilder::new(&self.gate, &self.config).build(module, type_name)
    }

    /// Resolves a global `module!symbol` to its type and address.
    pub fn get_global_symbol(
        &self,
        module: &str,
        symbol: &str,
    ) -> Result<SymbolResult, EngineError> {
        SymbolResolver::new(&self.gate, &self.config).resolve_global(module, symbol)
    }

    /// Finds `symbol` among the locals of every stack frame currently inside
    /// `module!method`.
    pub fn get_local_symbols(
        &self,
        module: &str,
        method: &str,
        symbol: &str,
    ) -> Result<Vec<SymbolResult>, EngineError> {
        SymbolResolver::new(&self.gate, &self.config).resolve_locals_in_stack(
            module,
            method,
            symbol,
            self.config.max_stack_frames,
        )
    }

    /// Finds `symbol` among the locals of one specific frame.
    pub fn get_local_symbols_in_frame(
        &self,
        frame: &StackFrame,
        symbol: &str,
    ) -> Result<Vec<SymbolResult>, EngineError> {
        SymbolResolver::new(&self.gate, &self.config).resolve_locals(frame, symbol)
    }

    /// Resolves an address to the nearest preceding `module!name` symbol
    /// plus displacement.
    pub fn get_symbol_name(&self, address: u64) -> Result<SymbolName, EngineError> {
        SymbolResolver::new(&self.gate, &self.config).resolve_symbol_name(address)
    }
}
