/// Command registry: name/alias lookup over immutable command descriptors.
///
/// Populated once at startup (from a manifest plus a catalog of factories)
/// and read-only afterwards, so lookups need no synchronization.
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::descriptor::CommandDescriptor;
use crate::error::ConfigError;
use crate::manifest::CommandManifest;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

type Factory = Box<dyn Fn() -> Result<CommandDescriptor, ConfigError> + Send + Sync>;

/// Maps fully qualified command identifiers to descriptor factories.
///
/// This is the explicit registration step: every command the process can
/// serve is added here, and the manifest selects which ones get loaded.
#[derive(Default)]
pub struct CommandCatalog {
    factories: HashMap<String, Factory>,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<CommandDescriptor, ConfigError> + Send + Sync + 'static,
    {
        self.factories.insert(identifier.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Build the descriptor registered under `identifier`.
    pub fn build(&self, identifier: &str) -> Result<CommandDescriptor, ConfigError> {
        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| ConfigError::UnknownIdentifier(identifier.to_string()))?;
        factory()
    }

    /// All identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct CommandRegistry {
    case_insensitive: bool,
    commands: Vec<Arc<CommandDescriptor>>,
    /// Normalized name or alias -> index into `commands`.
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            commands: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a registry with every command the manifest lists.
    pub fn from_manifest(
        manifest: &CommandManifest,
        catalog: &CommandCatalog,
        case_insensitive: bool,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::new(case_insensitive);
        for identifier in manifest.identifiers() {
            let descriptor = catalog.build(identifier)?;
            debug!(identifier, command = %descriptor.name, "Loading command from manifest");
            registry.register(descriptor)?;
        }
        info!(commands = registry.len(), "Command registry populated");
        Ok(registry)
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    fn normalize(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Register a command under its name and every alias.
    ///
    /// Fails without modifying the registry if any of those names is taken.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<Arc<CommandDescriptor>, ConfigError> {
        let mut keys: Vec<String> = Vec::new();
        for name in descriptor.all_names() {
            let key = self.normalize(name);
            if let Some(&existing) = self.index.get(&key) {
                return Err(ConfigError::DuplicateName {
                    name: name.to_string(),
                    owner: self.commands[existing].name.clone(),
                });
            }
            if keys.contains(&key) {
                return Err(ConfigError::DuplicateName {
                    name: name.to_string(),
                    owner: descriptor.name.clone(),
                });
            }
            keys.push(key);
        }

        let slot = self.commands.len();
        let descriptor = Arc::new(descriptor);
        self.commands.push(Arc::clone(&descriptor));
        for key in keys {
            self.index.insert(key, slot);
        }
        debug!(command = %descriptor.name, aliases = ?descriptor.aliases, "Registered command");
        Ok(descriptor)
    }

    /// Find a command by name or alias.
    pub fn lookup(&self, name: &str) -> Option<&Arc<CommandDescriptor>> {
        self.index
            .get(&self.normalize(name))
            .map(|&slot| &self.commands[slot])
    }

    /// Every registered command, in registration order.
    pub fn all(&self) -> &[Arc<CommandDescriptor>] {
        &self.commands
    }

    /// Every name and alias as registered (not normalized).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().flat_map(|c| c.all_names())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}
