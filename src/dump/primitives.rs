// Tue Feb 10 2026 - Alex

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Byte sizes for the primitive type names the structured API reports.
/// Consulted before falling back to a type-id/size query when a parsed
/// field left its size unresolved.
static BUILTIN_SIZES: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("char", 1),
        ("signed char", 1),
        ("unsigned char", 1),
        ("wchar_t", 2),
        ("short", 2),
        ("unsigned short", 2),
        ("int", 4),
        ("unsigned int", 4),
        ("long", 4),
        ("unsigned long", 4),
        ("int64", 8),
        ("unsigned int64", 8),
        ("long long", 8),
        ("unsigned long long", 8),
        ("float", 4),
        ("double", 8),
        ("bool", 1),
        ("void", 0),
    ])
});

pub fn builtin_size(type_name: &str) -> Option<u32> {
    BUILTIN_SIZES.get(type_name).copied()
}

/// Normalizes a dump-command primitive token (`Int4B`, `UChar`, ...) to the
/// C name the structured API uses, with its byte size.
pub fn dump_primitive(token: &str) -> Option<(&'static str, u32)> {
    let normalized = match token {
        "Char" => ("char", 1),
        "UChar" => ("unsigned char", 1),
        "Wchar" => ("wchar_t", 2),
        "Int2B" => ("short", 2),
        "Uint2B" => ("unsigned short", 2),
        "Int4B" => ("int", 4),
        "Uint4B" => ("unsigned int", 4),
        "Int8B" => ("int64", 8),
        "Uint8B" => ("unsigned int64", 8),
        "Float" => ("float", 4),
        "Double" => ("double", 8),
        "Bool" => ("bool", 1),
        "Void" => ("void", 0),
        _ => return None,
    };
    Some(normalized)
}
