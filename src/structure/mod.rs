// Tue Feb 10 2026 - Alex

pub mod builder;
pub mod model;

pub use builder::TypeBuilder;
pub use model::{BaseType, BitField, Field, SymbolName, SymbolResult, Type};
