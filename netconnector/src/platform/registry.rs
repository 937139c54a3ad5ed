//! Platform registry for looking up platform definitions.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};
use crate::parser::OutputParser;

/// Built-in platforms, built on first use.
static BUILTIN: OnceCell<Arc<PlatformRegistry>> = OnceCell::new();

/// Registry for platform definitions.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, Arc<PlatformDefinition>>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Registry holding every vendor shipped with the crate.
    pub fn builtin() -> Result<Arc<Self>> {
        BUILTIN
            .get_or_try_init(|| {
                let mut registry = Self::new();
                for platform in vendors::all()? {
                    registry.register(platform)?;
                }
                Ok(Arc::new(registry))
            })
            .cloned()
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::InvalidDefinition {
                message: format!("platform '{}' registered twice", platform.name),
            }
            .into());
        }
        self.platforms
            .insert(platform.name.clone(), Arc::new(platform));
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Result<Arc<PlatformDefinition>> {
        self.platforms
            .get(name)
            .cloned()
            .ok_or_else(|| PlatformError::UnknownPlatform { name: name.to_string() }.into())
    }

    /// Check if a platform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// List all registered platform names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.platforms.keys()
    }

    /// Check that every grammar a platform refers to is known to `parser`.
    pub fn validate(&self, parser: &OutputParser) -> Result<()> {
        for platform in self.platforms.values() {
            if let Some(missing) = platform
                .template_keys()
                .into_iter()
                .find(|key| !parser.contains(key))
            {
                return Err(PlatformError::InvalidDefinition {
                    message: format!("{} refers to unknown template {missing}", platform.name),
                }
                .into());
            }
        }
        Ok(())
    }
}
