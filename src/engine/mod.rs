// Wed Feb 11 2026 - Alex

pub mod core;

pub use core::DebuggerEngine;
