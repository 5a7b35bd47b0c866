// Tue Feb 10 2026 - Alex

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DebugSession, LocalSymbol, SessionError, SessionResult, StackFrame};

/// Serialized state of a frozen debugging session: module/type tables as
/// the structured symbol API would report them, the textual transcripts of
/// dump commands, symbol addresses, and the captured call stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCapture {
    /// Whether the target is stopped at capture time. When false, every
    /// query reports a busy session until a break-in is waited for.
    #[serde(default)]
    pub broken_in: bool,
    #[serde(default)]
    pub modules: Vec<ModuleCapture>,
    /// Command text -> the exact output the command produced.
    #[serde(default)]
    pub dumps: HashMap<String, String>,
    #[serde(default)]
    pub symbols: Vec<SymbolCapture>,
    #[serde(default)]
    pub frames: Vec<FrameCapture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleCapture {
    pub name: String,
    pub base: u64,
    #[serde(default)]
    pub types: Vec<TypeCapture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeCapture {
    pub id: u32,
    pub name: String,
    pub size: u32,
    #[serde(default)]
    pub fields: Vec<FieldCapture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldCapture {
    pub name: String,
    pub type_id: u32,
    pub offset: u32,
}

/// A global symbol with a resolved address, also used to answer
/// address-to-name queries (nearest preceding symbol wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolCapture {
    /// Qualified `module!name`.
    pub name: String,
    pub module_base: u64,
    #[serde(default)]
    pub type_id: u32,
    pub address: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameCapture {
    pub frame_address: u64,
    pub stack_address: u64,
    pub instruction_address: u64,
    /// Qualified `module!function` the frame's instruction belongs to.
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub locals: Vec<LocalCapture>,
}

impl FrameCapture {
    pub fn frame(&self) -> StackFrame {
        StackFrame {
            frame_address: self.frame_address,
            stack_address: self.stack_address,
            instruction_address: self.instruction_address,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalCapture {
    pub name: String,
    pub module_base: u64,
    pub type_id: u32,
    /// Zero means the value lives in a register.
    #[serde(default)]
    pub address: u64,
    /// The register's value, consulted when `address` is zero.
    #[serde(default)]
    pub register_value: u64,
}

/// A [`DebugSession`] replayed from a capture. This is the offline
/// counterpart of a live engine connection: same boundary, same busy/break
/// behavior, but answers come from the capture instead of the target.
pub struct ReplaySession {
    capture: SessionCapture,
    broken_in: bool,
    scope: StackFrame,
}

impl ReplaySession {
    pub fn new(capture: SessionCapture) -> Self {
        let broken_in = capture.broken_in;
        let scope = capture
            .frames
            .first()
            .map(FrameCapture::frame)
            .unwrap_or_default();
        Self {
            capture,
            broken_in,
            scope,
        }
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let capture: SessionCapture = serde_json::from_str(&text)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
        Ok(Self::new(capture))
    }

    fn ensure_broken_in(&self) -> SessionResult<()> {
        if self.broken_in {
            Ok(())
        } else {
            Err(SessionError::Busy("target is running".to_string()))
        }
    }

    fn module(&self, module_base: u64) -> SessionResult<&ModuleCapture> {
        self.capture
            .modules
            .iter()
            .find(|module| module.base == module_base)
            .ok_or_else(|| SessionError::Failed(format!("no module at base 0x{:x}", module_base)))
    }

    fn type_by_id(&self, module_base: u64, type_id: u32) -> SessionResult<&TypeCapture> {
        self.module(module_base)?
            .types
            .iter()
            .find(|entry| entry.id == type_id)
            .ok_or_else(|| SessionError::Failed(format!("no type with id {}", type_id)))
    }

    fn current_frame(&self) -> Option<&FrameCapture> {
        self.capture
            .frames
            .iter()
            .find(|frame| frame.frame() == self.scope)
    }
}

impl DebugSession for ReplaySession {
    fn module_base(&mut self, module: &str) -> SessionResult<u64> {
        self.ensure_broken_in()?;
        self.capture
            .modules
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(module))
            .map(|entry| entry.base)
            .ok_or_else(|| SessionError::Failed(format!("module not found: {}", module)))
    }

    fn module_name(&mut self, module_base: u64) -> SessionResult<String> {
        self.ensure_broken_in()?;
        self.module(module_base).map(|module| module.name.clone())
    }

    fn type_id(&mut self, module_base: u64, type_name: &str) -> SessionResult<u32> {
        self.ensure_broken_in()?;
        self.module(module_base)?
            .types
            .iter()
            .find(|entry| entry.name == type_name)
            .map(|entry| entry.id)
            .ok_or_else(|| SessionError::Failed(format!("type not found: {}", type_name)))
    }

    fn type_size(&mut self, module_base: u64, type_id: u32) -> SessionResult<u32> {
        self.ensure_broken_in()?;
        self.type_by_id(module_base, type_id).map(|entry| entry.size)
    }

    fn field_type_and_offset(
        &mut self,
        module_base: u64,
        type_id: u32,
        field_name: &str,
    ) -> SessionResult<(u32, u32)> {
        self.ensure_broken_in()?;
        self.type_by_id(module_base, type_id)?
            .fields
            .iter()
            .find(|field| field.name == field_name)
            .map(|field| (field.type_id, field.offset))
            .ok_or_else(|| SessionError::Failed(format!("field not found: {}", field_name)))
    }

    fn type_name(&mut self, module_base: u64, type_id: u32) -> SessionResult<String> {
        self.ensure_broken_in()?;
        self.type_by_id(module_base, type_id).map(|entry| entry.name.clone())
    }

    fn symbol_name(&mut self, address: u64) -> SessionResult<(String, u64)> {
        self.ensure_broken_in()?;
        if let Some(frame) = self
            .capture
            .frames
            .iter()
            .find(|frame| frame.instruction_address == address)
        {
            if let Some(function) = &frame.function {
                return Ok((function.clone(), 0));
            }
        }
        self.capture
            .symbols
            .iter()
            .filter(|symbol| symbol.address <= address)
            .max_by_key(|symbol| symbol.address)
            .map(|symbol| (symbol.name.clone(), address - symbol.address))
            .ok_or_else(|| SessionError::Failed(format!("no symbol at 0x{:x}", address)))
    }

    fn symbol_type_id(&mut self, qualified_name: &str) -> SessionResult<(u32, u64)> {
        self.ensure_broken_in()?;
        self.capture
            .symbols
            .iter()
            .find(|symbol| symbol.name == qualified_name)
            .map(|symbol| (symbol.type_id, symbol.module_base))
            .ok_or_else(|| SessionError::Failed(format!("symbol not found: {}", qualified_name)))
    }

    fn offset_by_name(&mut self, name: &str) -> SessionResult<u64> {
        self.ensure_broken_in()?;
        if name.contains('!') {
            return self
                .capture
                .symbols
                .iter()
                .find(|symbol| symbol.name == name)
                .map(|symbol| symbol.address)
                .ok_or_else(|| SessionError::Failed(format!("symbol not found: {}", name)));
        }
        // Unqualified names resolve against the current scope, the way the
        // locals path asks for a register-resident pointer's value.
        self.current_frame()
            .and_then(|frame| frame.locals.iter().find(|local| local.name == name))
            .map(|local| {
                if local.address != 0 {
                    local.address
                } else {
                    local.register_value
                }
            })
            .ok_or_else(|| SessionError::Failed(format!("local not found in scope: {}", name)))
    }

    fn execute(&mut self, command: &str, sink: &mut dyn FnMut(&str)) -> SessionResult<()> {
        self.ensure_broken_in()?;
        match self.capture.dumps.get(command) {
            Some(transcript) => {
                sink(transcript);
                Ok(())
            }
            None => Err(SessionError::Failed(format!(
                "unrecognized command: {}",
                command
            ))),
        }
    }

    fn wait_for_break(&mut self) -> SessionResult<()> {
        // A frozen capture "breaks in" immediately; a live session would
        // block on the engine's event channel here.
        self.broken_in = true;
        Ok(())
    }

    fn current_scope(&mut self) -> SessionResult<StackFrame> {
        self.ensure_broken_in()?;
        Ok(self.scope)
    }

    fn set_scope(&mut self, frame: &StackFrame) -> SessionResult<()> {
        self.ensure_broken_in()?;
        self.scope = *frame;
        Ok(())
    }

    fn stack_frames(&mut self, max_frames: usize) -> SessionResult<Vec<StackFrame>> {
        self.ensure_broken_in()?;
        Ok(self
            .capture
            .frames
            .iter()
            .take(max_frames)
            .map(FrameCapture::frame)
            .collect())
    }

    fn scope_symbols(&mut self) -> SessionResult<Vec<LocalSymbol>> {
        self.ensure_broken_in()?;
        let locals = match self.current_frame() {
            Some(frame) => frame
                .locals
                .iter()
                .map(|local| LocalSymbol {
                    name: local.name.clone(),
                    module_base: local.module_base,
                    type_id: local.type_id,
                    address: local.address,
                })
                .collect(),
            None => Vec::new(),
        };
        Ok(locals)
    }
}
