// Wed Feb 11 2026 - Alex

pub mod resolver;

pub use resolver::SymbolResolver;
