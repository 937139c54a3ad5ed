//! Privilege level definition.

use regex::bytes::Regex;

use crate::error::Result;

/// The privileged CLI mode of a device and how to get there.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this privilege level (e.g., "enable", "admin").
    pub name: String,

    /// Prompt of the privileged mode.
    pub pattern: Regex,

    /// Command that enters the mode.
    pub escalate_command: String,

    /// Password question asked after the escalate command. `None` means the
    /// mode is entered without a secret.
    pub auth_prompt: Option<Regex>,
}

impl PrivilegeLevel {
    /// Create a new privilege level with minimal required fields.
    pub fn new(name: impl Into<String>, pattern: &str, escalate_command: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            escalate_command: escalate_command.into(),
            auth_prompt: None,
        })
    }

    /// Set that escalation requires authentication.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self> {
        self.auth_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    pub fn requires_secret(&self) -> bool {
        self.auth_prompt.is_some()
    }

    /// Check if this privilege level matches a prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        self.pattern.is_match(prompt.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_level() {
        let level = PrivilegeLevel::new("enable", r"#\s*$", "enable")
            .unwrap()
            .with_auth(r"(?i)password:\s*$")
            .unwrap();
        assert!(level.requires_secret());
        assert!(level.matches("switch#"));
        assert!(!level.matches("switch>"));
    }
}
