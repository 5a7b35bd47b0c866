// Mon Feb 9 2026 - Alex

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Template for the verbose type dump command. `{module}` and `{type}`
    /// are substituted per lookup.
    pub dump_command: String,
    /// Upper bound on frames walked when searching the stack for a method.
    pub max_stack_frames: usize,
    /// Module names compare case-insensitively when matching stack frames.
    pub case_insensitive_modules: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dump_command: "dt -v {module}!{type}".to_string(),
            max_stack_frames: 128,
            case_insensitive_modules: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dump_command(mut self, command: String) -> Self {
        self.dump_command = command;
        self
    }

    pub fn with_max_stack_frames(mut self, max_frames: usize) -> Self {
        self.max_stack_frames = max_frames;
        self
    }

    pub fn with_case_insensitive_modules(mut self, enabled: bool) -> Self {
        self.case_insensitive_modules = enabled;
        self
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
    }

    pub fn render_dump_command(&self, module: &str, type_name: &str) -> String {
        self.dump_command
            .replace("{module}", module)
            .replace("{type}", type_name)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.dump_command.is_empty() {
            return Err("dump_command must not be empty".to_string());
        }
        if !self.dump_command.contains("{module}") || !self.dump_command.contains("{type}") {
            return Err("dump_command must contain {module} and {type}".to_string());
        }
        if self.max_stack_frames == 0 {
            return Err("max_stack_frames must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_renders_the_dump_command() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.render_dump_command("nt", "_EPROCESS"),
            "dt -v nt!_EPROCESS"
        );
    }

    #[test]
    fn validation_rejects_a_template_without_placeholders() {
        let config = EngineConfig::default().with_dump_command("dt -v nt!Foo".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_a_zero_frame_limit() {
        let config = EngineConfig::default().with_max_stack_frames(0);
        assert!(config.validate().is_err());
    }
}
