// Tue Feb 10 2026 - Alex

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use super::primitives::dump_primitive;
use crate::structure::model::BitField;

/// A field as the dump text described it. `None` for the size or type name
/// marks it unresolved; the builder fills the gap from the structured API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub offset: u32,
    pub size: Option<u32>,
    pub type_name: Option<String>,
    pub bit_field: Option<BitField>,
}

/// A base class as the dump text described it. `index` is the parse order,
/// used only to break ties between base classes ending at the same offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBaseClass {
    pub type_name: String,
    pub offset: u32,
    pub size: u32,
    pub index: usize,
}

/// Everything one logical dump request produced, accumulated across the
/// primary pass and any anonymous-enum follow-up passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DumpRecords {
    pub fields: Vec<RawField>,
    pub base_classes: Vec<RawBaseClass>,
    pub constants: IndexMap<String, u64>,
    pub is_enum: bool,
}

// Shapes of `dt -v` output, line by line. The header and constant lines are
// also produced by anonymous-enum follow-up dumps fed into the same parser.
static FIELD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+\+0x([0-9a-fA-F]+)\s+(\S+)\s*:\s*(.+?)\s*$").unwrap());
static BASE_CLASS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s+base class:\s+(?:struct|class|union)\s+(.+?),\s+\d+\s+elements?,\s+0x([0-9a-fA-F]+)\s+bytes\s+@\s+0x([0-9a-fA-F]+)\s*$",
    )
    .unwrap()
});
static STRUCT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:struct|class|union)\s+.+?,\s+\d+\s+elements?,\s+0x[0-9a-fA-F]+\s+bytes\s*$")
        .unwrap()
});
static ENUM_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Enum\s+\S+,\s+\d+\s+total enums?\s*$").unwrap());
static CONSTANT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+(\S+)\s*=\s*(0n\d+|0x[0-9a-fA-F]+|\d+)\s*$").unwrap());

// Shapes of the type text to the right of a field's `:`.
static BITFIELD_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Pos\s+(\d+),\s+(\d+)\s+Bits?$").unwrap());
static ARRAY_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\d+)\]\s+(.+)$").unwrap());
static EMBEDDED_STRUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:struct|class|union)\s+(.+?),\s+\d+\s+elements?,\s+0x([0-9a-fA-F]+)\s+bytes$")
        .unwrap()
});
static EMBEDDED_ENUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Enum\s+(.+?),\s+\d+\s+total enums?$").unwrap());

/// Line-driven parser for the output of one type-dump command.
///
/// Output text is buffered through [`feed`](Self::feed) while the sink is
/// attached, then drained by [`parse`](Self::parse). The parser is
/// re-entrant: records accumulate across passes (the requested type first,
/// then one pass per discovered anonymous enum) until
/// [`finish`](Self::finish) produces the combined [`DumpRecords`].
#[derive(Default)]
pub struct DumpParser {
    buffer: String,
    fields: Vec<RawField>,
    base_classes: Vec<RawBaseClass>,
    constants: IndexMap<String, u64>,
    anonymous_enums: Vec<String>,
    is_enum: Option<bool>,
}

impl DumpParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw command output. Called by the output sink while a dump
    /// command executes.
    pub fn feed(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Drains the buffered text into records.
    pub fn parse(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        for line in buffer.lines() {
            self.parse_line(line.trim_end_matches('\r'));
        }
    }

    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Anonymous enum type names referenced by parsed fields but not yet
    /// dumped. Draining resets the queue so a follow-up pass cannot re-dump
    /// the same enum.
    pub fn take_anonymous_enums(&mut self) -> Vec<String> {
        std::mem::take(&mut self.anonymous_enums)
    }

    pub fn finish(mut self) -> DumpRecords {
        self.parse();
        DumpRecords {
            fields: self.fields,
            base_classes: self.base_classes,
            constants: self.constants,
            is_enum: self.is_enum.unwrap_or(false),
        }
    }

    fn parse_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        if let Some(caps) = BASE_CLASS_LINE.captures(line) {
            // An out-of-range size or offset must not alias to 0; drop the
            // line rather than misplace the base class.
            let (Ok(size), Ok(offset)) = (
                u32::from_str_radix(&caps[2], 16),
                u32::from_str_radix(&caps[3], 16),
            ) else {
                log::warn!("dump parser skipped out-of-range base class line: {:?}", line);
                return;
            };
            self.base_classes.push(RawBaseClass {
                type_name: caps[1].to_string(),
                offset,
                size,
                index: self.base_classes.len(),
            });
            return;
        }
        if let Some(caps) = FIELD_LINE.captures(line) {
            let Ok(offset) = u32::from_str_radix(&caps[1], 16) else {
                log::warn!("dump parser skipped out-of-range field line: {:?}", line);
                return;
            };
            let name = caps[2].to_string();
            let (type_name, size, bit_field) =
                parse_type_text(&caps[3], &mut self.anonymous_enums);
            self.fields.push(RawField {
                name,
                offset,
                size,
                type_name,
                bit_field,
            });
            return;
        }
        if ENUM_HEADER.is_match(line) {
            // Only the first header of the first pass decides whether the
            // requested type is an enum; follow-up passes for anonymous
            // enums must not reclassify it.
            self.is_enum.get_or_insert(true);
            return;
        }
        if STRUCT_HEADER.is_match(line) {
            self.is_enum.get_or_insert(false);
            return;
        }
        if let Some(caps) = CONSTANT_LINE.captures(line) {
            if let Some(value) = parse_constant_value(&caps[2]) {
                let name = caps[1].to_string();
                self.constants.entry(name).or_insert(value);
            }
            return;
        }
        log::trace!("dump parser skipped line: {:?}", line);
    }
}

/// Parses the type text to the right of a field's `:` into
/// (type name, size, bitfield). Unresolvable text yields `None`s for the
/// builder to reconcile against the structured API.
fn parse_type_text(
    text: &str,
    anonymous_enums: &mut Vec<String>,
) -> (Option<String>, Option<u32>, Option<BitField>) {
    let text = text.trim();

    if let Some(caps) = BITFIELD_TEXT.captures(text) {
        let bit_offset = caps[1].parse().unwrap_or(0);
        let bit_length = caps[2].parse().unwrap_or(0);
        // The storage unit's type is not in the text; both the name and the
        // size stay unresolved.
        return (None, None, Some(BitField { bit_offset, bit_length }));
    }
    if let Some(rest) = text.strip_prefix("Ptr64 to ") {
        let (inner, _, _) = parse_type_text(rest, anonymous_enums);
        return (inner.map(|name| format!("{}*", name)), Some(8), None);
    }
    if let Some(rest) = text.strip_prefix("Ptr32 to ") {
        let (inner, _, _) = parse_type_text(rest, anonymous_enums);
        return (inner.map(|name| format!("{}*", name)), Some(4), None);
    }
    if let Some(caps) = ARRAY_TEXT.captures(text) {
        let count: u32 = caps[1].parse().unwrap_or(0);
        let (inner, inner_size, _) = parse_type_text(&caps[2], anonymous_enums);
        let name = inner.map(|name| format!("{}[{}]", name, count));
        // A count large enough to overflow the total leaves the size
        // unresolved for the structured fallback.
        let size = inner_size.and_then(|size| size.checked_mul(count));
        return (name, size, None);
    }
    if let Some(caps) = EMBEDDED_STRUCT.captures(text) {
        let size = u32::from_str_radix(&caps[2], 16).ok();
        return (Some(caps[1].to_string()), size, None);
    }
    if let Some(caps) = EMBEDDED_ENUM.captures(text) {
        let name = caps[1].to_string();
        if name.contains("<unnamed-") && !anonymous_enums.contains(&name) {
            anonymous_enums.push(name.clone());
        }
        return (Some(name), Some(4), None);
    }
    if let Some((name, size)) = dump_primitive(text) {
        return (Some(name.to_string()), Some(size), None);
    }
    (None, None, None)
}

fn parse_constant_value(text: &str) -> Option<u64> {
    if let Some(decimal) = text.strip_prefix("0n") {
        decimal.parse().ok()
    } else if let Some(hex) = text.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}
