// Mon Feb 9 2026 - Alex

pub mod config;
pub mod dump;
pub mod engine;
pub mod error;
pub mod session;
pub mod structure;
pub mod symbol;
pub mod utils;

pub use config::EngineConfig;
pub use engine::DebuggerEngine;
pub use error::EngineError;
pub use session::{DebugSession, ReplaySession, SessionCapture, SessionGate, StackFrame};
pub use structure::{SymbolName, SymbolResult, Type};
pub use symbol::SymbolResolver;
