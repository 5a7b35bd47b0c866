// Wed Feb 11 2026 - Alex

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::session::{classify, with_scope, DebugSession, SessionError, SessionGate, StackFrame};
use crate::structure::model::{SymbolName, SymbolResult};

/// Resolves global symbols, stack-frame locals, and addresses back to
/// names, all through the session gate.
pub struct SymbolResolver<'a> {
    gate: &'a SessionGate,
    config: &'a EngineConfig,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(gate: &'a SessionGate, config: &'a EngineConfig) -> Self {
        Self { gate, config }
    }

    /// Resolves a fully qualified `module!symbol` to its type and address.
    pub fn resolve_global(&self, module: &str, symbol: &str) -> Result<SymbolResult, EngineError> {
        let qualified = format!("{}!{}", module, symbol);
        let context = format!("Unable to lookup global symbol: {}", qualified);
        self.gate.attempt(&context, |session| {
            let invalid = || EngineError::InvalidSymbol(format!("Invalid symbol: {}", qualified));
            let (type_id, module_base) =
                classify(session.symbol_type_id(&qualified), invalid)?;
            let address = classify(session.offset_by_name(&qualified), invalid)?;

            // The ids resolved, so failing to decode them back into names is
            // an engine-side inconsistency rather than a bad symbol.
            let internal = || {
                EngineError::InternalInconsistency(format!(
                    "Internal error with symbol: {}",
                    qualified
                ))
            };
            let type_name = classify(session.type_name(module_base, type_id), internal)?;
            let module = classify(session.module_name(module_base), internal)?;
            Ok(SymbolResult {
                module,
                type_name,
                address,
            })
        })
    }

    /// Scans one stack frame's argument + local group for `symbol_name`,
    /// switching the session scope to the frame and restoring it on every
    /// exit path. At most one match is returned; the scan stops at the
    /// first.
    pub fn resolve_locals(
        &self,
        frame: &StackFrame,
        symbol_name: &str,
    ) -> Result<Vec<SymbolResult>, EngineError> {
        let context = format!("Unable to lookup local symbol: {}", symbol_name);
        self.gate.attempt(&context, |session| {
            with_scope(session, frame, |session| {
                locals_in_current_scope(session, symbol_name)
            })
        })
    }

    /// Walks up to `max_frames` stack frames, matches frames whose
    /// instruction address resolves to `module!method`, and collects local
    /// matches from each.
    pub fn resolve_locals_in_stack(
        &self,
        module: &str,
        method: &str,
        symbol_name: &str,
        max_frames: usize,
    ) -> Result<Vec<SymbolResult>, EngineError> {
        let context = format!(
            "Unable to lookup local symbol: {} in {}!{}",
            symbol_name, module, method
        );
        self.gate.attempt(&context, |session| {
            let frames = session.stack_frames(max_frames)?;
            let mut results = Vec::new();
            for frame in frames {
                let qualified = match session.symbol_name(frame.instruction_address) {
                    Ok((qualified, _displacement)) => qualified,
                    Err(SessionError::Busy(reason)) => return Err(SessionError::Busy(reason)),
                    // Frames without symbols are skipped, not fatal.
                    Err(_) => continue,
                };
                let Some((frame_module, frame_method)) = qualified.split_once('!') else {
                    continue;
                };
                if !self.module_matches(frame_module, module) || frame_method != method {
                    continue;
                }
                let matches = with_scope(session, &frame, |session| {
                    locals_in_current_scope(session, symbol_name)
                })?;
                results.extend(matches);
            }
            Ok(results)
        })
    }

    /// Resolves an address to its `module!name` symbol plus displacement.
    pub fn resolve_symbol_name(&self, address: u64) -> Result<SymbolName, EngineError> {
        let context = format!("Unable to lookup symbol at address: 0x{:x}", address);
        self.gate.attempt(&context, |session| {
            let (qualified, displacement) = session.symbol_name(address)?;
            split_qualified(&qualified, displacement).map_err(SessionError::Classified)
        })
    }

    fn module_matches(&self, candidate: &str, requested: &str) -> bool {
        if self.config.case_insensitive_modules {
            candidate.eq_ignore_ascii_case(requested)
        } else {
            candidate == requested
        }
    }
}

/// Scans the current scope for `symbol_name`, stopping at the first match.
/// Memory-resident locals report their address directly. Register-resident
/// pointers report the register's value as the address with the trailing
/// `*` stripped, since the caller then holds the pointee's address, not a
/// pointer to it. Register-resident non-pointers have no expressible
/// address and are omitted.
fn locals_in_current_scope(
    session: &mut dyn DebugSession,
    symbol_name: &str,
) -> Result<Vec<SymbolResult>, SessionError> {
    let mut results = Vec::new();
    for local in session.scope_symbols()? {
        if local.name != symbol_name {
            continue;
        }
        let module = session.module_name(local.module_base)?;
        let type_name = session.type_name(local.module_base, local.type_id)?;
        if local.address != 0 {
            results.push(SymbolResult {
                module,
                type_name,
                address: local.address,
            });
        } else if let Some(pointee) = type_name.strip_suffix('*') {
            let address = session.offset_by_name(&local.name)?;
            results.push(SymbolResult {
                module,
                type_name: pointee.trim_end().to_string(),
                address,
            });
        } else {
            log::debug!(
                "local {} is register-resident and non-pointer; omitted",
                local.name
            );
        }
        break;
    }
    Ok(results)
}

pub(crate) fn split_qualified(
    qualified: &str,
    displacement: u64,
) -> Result<SymbolName, EngineError> {
    match qualified.split_once('!') {
        Some((module, name)) if !module.is_empty() && !name.is_empty() => Ok(SymbolName {
            module: module.to_string(),
            name: name.to_string(),
            displacement,
        }),
        _ => Err(EngineError::InvalidSymbol(format!(
            "Symbol name is not module-qualified: {}",
            qualified
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::replay::{
        FrameCapture, LocalCapture, ModuleCapture, ReplaySession, SessionCapture, SymbolCapture,
        TypeCapture,
    };
    use crate::session::SessionGate;

    const MODULE_BASE: u64 = 0x1000_0000;

    fn capture() -> SessionCapture {
        SessionCapture {
            broken_in: true,
            modules: vec![ModuleCapture {
                name: "app".to_string(),
                base: MODULE_BASE,
                types: vec![
                    TypeCapture {
                        id: 1,
                        name: "Widget".to_string(),
                        size: 16,
                        fields: Vec::new(),
                    },
                    TypeCapture {
                        id: 2,
                        name: "Widget*".to_string(),
                        size: 8,
                        fields: Vec::new(),
                    },
                    TypeCapture {
                        id: 3,
                        name: "int".to_string(),
                        size: 4,
                        fields: Vec::new(),
                    },
                ],
            }],
            dumps: Default::default(),
            symbols: vec![
                SymbolCapture {
                    name: "app!gWidget".to_string(),
                    module_base: MODULE_BASE,
                    type_id: 1,
                    address: 0x1000_4000,
                },
                SymbolCapture {
                    name: "app!main".to_string(),
                    module_base: MODULE_BASE,
                    type_id: 0,
                    address: 0x1000_1000,
                },
            ],
            frames: vec![
                FrameCapture {
                    frame_address: 0x7f00,
                    stack_address: 0x7f00,
                    instruction_address: 0x1000_1020,
                    function: Some("app!main".to_string()),
                    locals: vec![
                        LocalCapture {
                            name: "p".to_string(),
                            module_base: MODULE_BASE,
                            type_id: 2,
                            address: 0,
                            register_value: 0xdead_beef,
                        },
                        LocalCapture {
                            name: "n".to_string(),
                            module_base: MODULE_BASE,
                            type_id: 3,
                            address: 0,
                            register_value: 5,
                        },
                        LocalCapture {
                            name: "w".to_string(),
                            module_base: MODULE_BASE,
                            type_id: 1,
                            address: 0x7e80,
                            register_value: 0,
                        },
                    ],
                },
                FrameCapture {
                    frame_address: 0x7fa0,
                    stack_address: 0x7fa0,
                    instruction_address: 0x2000_0000,
                    function: None,
                    locals: Vec::new(),
                },
            ],
        }
    }

    fn gate() -> SessionGate {
        SessionGate::new(Box::new(ReplaySession::new(capture())))
    }

    #[test]
    fn resolves_a_global_symbol() {
        let config = EngineConfig::default();
        let gate = gate();
        let resolver = SymbolResolver::new(&gate, &config);

        let result = resolver.resolve_global("app", "gWidget").unwrap();
        assert_eq!(result.module, "app");
        assert_eq!(result.type_name, "Widget");
        assert_eq!(result.address, 0x1000_4000);
    }

    #[test]
    fn rejects_an_unknown_global_symbol() {
        let config = EngineConfig::default();
        let gate = gate();
        let resolver = SymbolResolver::new(&gate, &config);

        let result = resolver.resolve_global("app", "gMissing");
        assert!(matches!(result, Err(EngineError::InvalidSymbol(_))));
    }

    #[test]
    fn register_pointer_local_strips_the_pointer_marker() {
        let config = EngineConfig::default();
        let gate = gate();
        let resolver = SymbolResolver::new(&gate, &config);

        let results = resolver
            .resolve_locals_in_stack("app", "main", "p", 8)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].type_name, "Widget");
        assert_eq!(results[0].address, 0xdead_beef);
    }

    #[test]
    fn register_non_pointer_local_is_omitted() {
        let config = EngineConfig::default();
        let gate = gate();
        let resolver = SymbolResolver::new(&gate, &config);

        let results = resolver
            .resolve_locals_in_stack("app", "main", "n", 8)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn memory_local_reports_its_address_directly() {
        let config = EngineConfig::default();
        let gate = gate();
        let resolver = SymbolResolver::new(&gate, &config);

        let results = resolver
            .resolve_locals_in_stack("APP", "main", "w", 8)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].type_name, "Widget");
        assert_eq!(results[0].address, 0x7e80);
    }

    #[test]
    fn non_matching_method_yields_no_locals() {
        let config = EngineConfig::default();
        let gate = gate();
        let resolver = SymbolResolver::new(&gate, &config);

        let results = resolver
            .resolve_locals_in_stack("app", "other_function", "p", 8)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn resolves_an_address_to_a_split_symbol_name() {
        let config = EngineConfig::default();
        let gate = gate();
        let resolver = SymbolResolver::new(&gate, &config);

        let name = resolver.resolve_symbol_name(0x1000_4010).unwrap();
        assert_eq!(name.module, "app");
        assert_eq!(name.name, "gWidget");
        assert_eq!(name.displacement, 0x10);
    }

    #[test]
    fn split_requires_the_qualified_form() {
        assert!(split_qualified("app!main", 0).is_ok());
        assert!(matches!(
            split_qualified("main", 0),
            Err(EngineError::InvalidSymbol(_))
        ));
        assert!(matches!(
            split_qualified("!main", 0),
            Err(EngineError::InvalidSymbol(_))
        ));
    }
}
