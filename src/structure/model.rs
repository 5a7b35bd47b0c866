// Tue Feb 10 2026 - Alex

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Sub-byte bit range a field occupies within its storage unit. Offset and
/// length always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BitField {
    pub bit_offset: u32,
    pub bit_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub offset: u32,
    pub size: u32,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_field: Option<BitField>,
}

/// Canonical description of one native type: its own fields, the base
/// classes embedded in it (each carrying only the fields attributable to
/// its extent), and its enum constants. Built fresh per request and
/// immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Type {
    pub module: String,
    pub name: String,
    pub size: u32,
    pub is_enum: bool,
    pub fields: HashMap<String, Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constants: Option<IndexMap<String, u64>>,
    pub base_types: Vec<BaseType>,
}

impl Type {
    /// Direct fields plus every base class's fields, recursively.
    pub fn total_field_count(&self) -> usize {
        self.fields.len()
            + self
                .base_types
                .iter()
                .map(|base| base.type_model.total_field_count())
                .sum::<usize>()
    }
}

/// A base class at its byte offset within the derived type. Exclusively
/// owns its embedded [`Type`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseType {
    #[serde(rename = "type")]
    pub type_model: Type,
    pub offset: u32,
}

/// A resolved symbol. An `address` of zero means the value lives in a
/// register and could not be expressed as an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolResult {
    pub module: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub address: u64,
}

/// `module!name` split apart, with the displacement from the symbol's start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolName {
    pub module: String,
    pub name: String,
    pub displacement: u64,
}
