// Tue Feb 10 2026 - Alex

pub mod parser;
pub mod primitives;

pub use parser::{DumpParser, DumpRecords, RawBaseClass, RawField};
pub use primitives::{builtin_size, dump_primitive};
