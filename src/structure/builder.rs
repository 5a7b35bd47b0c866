// Wed Feb 11 2026 - Alex

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::dump::parser::{DumpParser, DumpRecords, RawBaseClass};
use crate::dump::primitives::builtin_size;
use crate::error::EngineError;
use crate::session::{classify, DebugSession, SessionError, SessionGate, SessionResult};
use crate::utils::logging::ScopedTimer;

use super::model::{BaseType, Field, Type};

/// Builds the canonical [`Type`] for one (module, type name) pair by
/// running a dump, reconciling the parsed records against the structured
/// symbol facade, and assembling the base-class partition.
pub struct TypeBuilder<'a> {
    gate: &'a SessionGate,
    config: &'a EngineConfig,
}

impl<'a> TypeBuilder<'a> {
    pub fn new(gate: &'a SessionGate, config: &'a EngineConfig) -> Self {
        Self { gate, config }
    }

    pub fn build(&self, module: &str, type_name: &str) -> Result<Type, EngineError> {
        let _timer = ScopedTimer::new("build_type");
        let context = format!(
            "Unable to lookup type from debugger: {}!{}",
            module, type_name
        );
        self.gate.attempt(&context, |session| {
            build_in_session(session, self.config, module, type_name)
        })
    }
}

fn build_in_session(
    session: &mut dyn DebugSession,
    config: &EngineConfig,
    module: &str,
    type_name: &str,
) -> SessionResult<Type> {
    // Identity and total size come from the structured facade; a failure
    // here is a hard unknown-module/type error, not a parse problem.
    let module_base = classify(session.module_base(module), || {
        EngineError::UnknownModule(format!("Invalid module name: {}", module))
    })?;
    let type_id = classify(session.type_id(module_base, type_name), || {
        EngineError::UnknownType(format!("Invalid type name: {}", type_name))
    })?;
    let type_size = classify(session.type_size(module_base, type_id), || {
        EngineError::InternalInconsistency(format!(
            "Invalid type id for {}!{}",
            module, type_name
        ))
    })?;

    // The type is known to exist, so dump it. The parser is the output sink
    // for exactly the duration of each execute call.
    let mut parser = DumpParser::new();
    let command = config.render_dump_command(module, type_name);
    log::debug!("executing dump command: {}", command);
    session.execute(&command, &mut |text| parser.feed(text))?;
    parser.parse();

    // Fields can reference anonymous enums the primary dump did not define;
    // each gets its own pass through the same parser before finalizing.
    let pending = parser.take_anonymous_enums();
    if !pending.is_empty() {
        parser.clear_buffer();
        for enum_name in pending {
            let enum_command = config.render_dump_command(module, &enum_name);
            log::debug!("executing dump command: {}", enum_command);
            session.execute(&enum_command, &mut |text| parser.feed(text))?;
        }
        parser.parse();
    }

    let records = parser.finish();
    let resolved = resolve_fields(session, &records, module_base, type_id, module, type_name)?;
    Ok(assemble(module, type_name, type_size, records, resolved))
}

/// Fills the gaps the dump text left: unresolved type names via the
/// structured field lookup, unresolved sizes via the built-in primitive
/// table with a structured type-id/size fallback. Disagreement between the
/// two sources is an internal inconsistency, never retried.
fn resolve_fields(
    session: &mut dyn DebugSession,
    records: &DumpRecords,
    module_base: u64,
    type_id: u32,
    module: &str,
    type_name: &str,
) -> SessionResult<Vec<(String, Field)>> {
    let mut resolved = Vec::with_capacity(records.fields.len());
    for raw in &records.fields {
        let resolved_name = match &raw.type_name {
            Some(name) => name.clone(),
            None => {
                let inconsistent = || {
                    EngineError::InternalInconsistency(format!(
                        "Inconsistent field name \"{}\" when parsing type {}!{}",
                        raw.name, module, type_name
                    ))
                };
                let (field_type_id, offset) = classify(
                    session.field_type_and_offset(module_base, type_id, &raw.name),
                    inconsistent,
                )?;
                if offset != raw.offset {
                    // The structured API found a field by that name at a
                    // different offset; the two sources describe different
                    // fields.
                    return Err(SessionError::Classified(inconsistent()));
                }
                classify(session.type_name(module_base, field_type_id), inconsistent)?
            }
        };

        let resolved_size = match raw.size {
            Some(size) => size,
            None => match builtin_size(&resolved_name) {
                Some(size) => size,
                None => {
                    let unknown = || {
                        EngineError::InternalInconsistency(format!(
                            "Unknown type \"{}\" found when parsing type {}!{}",
                            resolved_name, module, type_name
                        ))
                    };
                    let field_type_id =
                        classify(session.type_id(module_base, &resolved_name), unknown)?;
                    classify(session.type_size(module_base, field_type_id), unknown)?
                }
            },
        };

        resolved.push((
            raw.name.clone(),
            Field {
                offset: raw.offset,
                size: resolved_size,
                type_name: resolved_name,
                bit_field: raw.bit_field,
            },
        ));
    }
    Ok(resolved)
}

/// Pure assembly step: orders the base classes, partitions the resolved
/// fields into per-base buckets, and produces the final [`Type`].
pub(crate) fn assemble(
    module: &str,
    type_name: &str,
    type_size: u32,
    records: DumpRecords,
    resolved: Vec<(String, Field)>,
) -> Type {
    let mut base_classes = records.base_classes;
    // Order the chain from furthest base to nearest: whichever base class
    // ends first is the further one; among base classes ending at the same
    // offset, the one declared later in the dump is the further one.
    base_classes.sort_by(|a, b| {
        let end_a = a.offset + a.size;
        let end_b = b.offset + b.size;
        end_a.cmp(&end_b).then_with(|| b.index.cmp(&a.index))
    });

    let mut base_types: Vec<BaseType> = Vec::new();
    let mut bucket: HashMap<String, Field> = HashMap::new();
    let mut cursor = 0usize;

    for (name, field) in resolved {
        // Close out every base class whose extent this field has moved past;
        // the fields accumulated so far belong to it.
        while cursor < base_classes.len() {
            let current = &base_classes[cursor];
            if field.offset + field.size > current.offset + current.size {
                base_types.push(close_base_class(module, current, std::mem::take(&mut bucket)));
                cursor += 1;
            } else {
                break;
            }
        }
        // A base class can declare a field with the same name as one in the
        // derived type; within a bucket the first occurrence wins.
        bucket.entry(name).or_insert(field);
    }

    // Trailing base classes with no fields of their own still close out, in
    // order, taking whatever accumulated since the last close-out.
    while cursor < base_classes.len() {
        base_types.push(close_base_class(
            module,
            &base_classes[cursor],
            std::mem::take(&mut bucket),
        ));
        cursor += 1;
    }

    // Constants attach to the final type even when they came from an
    // anonymous enum referenced by a field of a non-enum type.
    let constants = if records.is_enum || !records.constants.is_empty() {
        Some(records.constants)
    } else {
        None
    };

    Type {
        module: module.to_string(),
        name: type_name.to_string(),
        size: type_size,
        is_enum: records.is_enum,
        fields: bucket,
        constants,
        base_types,
    }
}

fn close_base_class(
    module: &str,
    base: &RawBaseClass,
    fields: HashMap<String, Field>,
) -> BaseType {
    // A base class's own bases and constants are not recoverable from a
    // single dump; the embedded type carries only the fields attributable
    // to its extent.
    BaseType {
        type_model: Type {
            module: module.to_string(),
            name: base.type_name.clone(),
            size: base.size,
            is_enum: false,
            fields,
            constants: None,
            base_types: Vec::new(),
        },
        offset: base.offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::parser::RawField;
    use indexmap::IndexMap;

    fn raw_base(name: &str, offset: u32, size: u32, index: usize) -> RawBaseClass {
        RawBaseClass {
            type_name: name.to_string(),
            offset,
            size,
            index,
        }
    }

    fn int_field(offset: u32) -> Field {
        Field {
            offset,
            size: 4,
            type_name: "int".to_string(),
            bit_field: None,
        }
    }

    fn records_with_bases(base_classes: Vec<RawBaseClass>) -> DumpRecords {
        DumpRecords {
            fields: Vec::new(),
            base_classes,
            constants: IndexMap::new(),
            is_enum: false,
        }
    }

    #[test]
    fn plain_struct_has_no_base_partition() {
        let resolved = vec![
            ("x".to_string(), int_field(0)),
            ("y".to_string(), int_field(4)),
        ];
        let built = assemble("app", "Point", 8, records_with_bases(Vec::new()), resolved);

        assert_eq!(built.size, 8);
        assert!(!built.is_enum);
        assert!(built.base_types.is_empty());
        assert!(built.constants.is_none());
        assert_eq!(built.fields.len(), 2);
        assert_eq!(built.fields["x"], int_field(0));
        assert_eq!(built.fields["y"], int_field(4));
    }

    #[test]
    fn fields_partition_into_base_class_extents() {
        // Derived : Base where Base ends at offset 4 and Derived adds z.
        let records = records_with_bases(vec![raw_base("Base", 0, 4, 0)]);
        let resolved = vec![
            ("w".to_string(), int_field(0)),
            ("z".to_string(), int_field(4)),
        ];
        let built = assemble("app", "Derived", 8, records, resolved);

        assert_eq!(built.base_types.len(), 1);
        let base = &built.base_types[0];
        assert_eq!(base.offset, 0);
        assert_eq!(base.type_model.name, "Base");
        assert_eq!(base.type_model.size, 4);
        assert!(base.type_model.fields.contains_key("w"));
        assert_eq!(built.fields.len(), 1);
        assert!(built.fields.contains_key("z"));
        assert_eq!(built.total_field_count(), 2);
    }

    #[test]
    fn base_classes_order_by_end_offset_then_reverse_parse_order() {
        let records = records_with_bases(vec![
            raw_base("Near", 0, 12, 0),
            raw_base("FarA", 0, 4, 1),
            raw_base("FarB", 0, 4, 2),
        ]);
        let built = assemble("app", "Derived", 16, records, Vec::new());

        let names: Vec<&str> = built
            .base_types
            .iter()
            .map(|base| base.type_model.name.as_str())
            .collect();
        // FarA and FarB end at the same offset: the later-declared FarB is
        // the further base class and sorts first.
        assert_eq!(names, vec!["FarB", "FarA", "Near"]);
    }

    #[test]
    fn trailing_base_classes_close_out_after_the_last_field() {
        let records = records_with_bases(vec![
            raw_base("Inner", 0, 4, 0),
            raw_base("Outer", 0, 8, 1),
        ]);
        // Both fields land inside Inner's extent; Outer has none of its own.
        let resolved = vec![("a".to_string(), int_field(0))];
        let built = assemble("app", "Derived", 8, records, resolved);

        assert_eq!(built.base_types.len(), 2);
        assert_eq!(built.base_types[0].type_model.name, "Inner");
        assert_eq!(built.base_types[0].type_model.fields.len(), 1);
        assert_eq!(built.base_types[1].type_model.name, "Outer");
        assert!(built.base_types[1].type_model.fields.is_empty());
        assert!(built.fields.is_empty());
    }

    #[test]
    fn shadowed_field_names_deduplicate_per_bucket_not_globally() {
        let records = records_with_bases(vec![raw_base("Base", 0, 4, 0)]);
        // Base declares x; the derived type declares its own x at a new
        // offset. Each bucket keeps its first occurrence.
        let resolved = vec![
            ("x".to_string(), int_field(0)),
            ("x".to_string(), int_field(4)),
            ("y".to_string(), int_field(8)),
        ];
        let built = assemble("app", "Derived", 12, records, resolved);

        let base = &built.base_types[0];
        assert_eq!(base.type_model.fields["x"].offset, 0);
        assert_eq!(built.fields["x"].offset, 4);
        assert_eq!(built.fields["y"].offset, 8);
    }

    #[test]
    fn duplicate_names_within_one_bucket_keep_the_first() {
        let resolved = vec![
            ("x".to_string(), int_field(0)),
            ("x".to_string(), int_field(4)),
        ];
        let built = assemble("app", "Odd", 8, records_with_bases(Vec::new()), resolved);
        assert_eq!(built.fields.len(), 1);
        assert_eq!(built.fields["x"].offset, 0);
    }

    #[test]
    fn partitioning_is_idempotent() {
        let records = records_with_bases(vec![
            raw_base("A", 0, 4, 0),
            raw_base("B", 0, 8, 1),
        ]);
        let resolved = vec![
            ("a".to_string(), int_field(0)),
            ("b".to_string(), int_field(4)),
            ("c".to_string(), int_field(8)),
        ];
        let first = assemble("app", "T", 12, records.clone(), resolved.clone());
        let second = assemble("app", "T", 12, records, resolved);
        assert_eq!(first, second);
    }

    #[test]
    fn field_counts_are_conserved_across_the_partition() {
        let records = records_with_bases(vec![
            raw_base("A", 0, 8, 0),
            raw_base("B", 0, 16, 1),
        ]);
        let resolved: Vec<(String, Field)> = (0..6)
            .map(|i| (format!("f{}", i), int_field(i * 4)))
            .collect();
        let total = resolved.len();
        let built = assemble("app", "T", 24, records, resolved);

        assert_eq!(built.base_types.len(), 2);
        assert_eq!(built.total_field_count(), total);
    }

    #[test]
    fn enum_records_keep_constants_and_no_fields() {
        let mut constants = IndexMap::new();
        constants.insert("Red".to_string(), 0u64);
        constants.insert("Green".to_string(), 1u64);
        let records = DumpRecords {
            fields: Vec::new(),
            base_classes: Vec::new(),
            constants,
            is_enum: true,
        };
        let built = assemble("app", "Color", 4, records, Vec::new());

        assert!(built.is_enum);
        assert!(built.fields.is_empty());
        let constants = built.constants.unwrap();
        assert_eq!(constants.get("Red"), Some(&0));
        assert_eq!(constants.get("Green"), Some(&1));
    }
}
