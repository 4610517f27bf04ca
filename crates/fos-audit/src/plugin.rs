//! Plugins
//!
//! A plugin is a named bundle of host commands registered on an
//! [`crate::Engine`]. Commands take and return JSON; the optional cleanup
//! hook runs when the engine is torn down.
//!
//! # Example
//! ```rust,ignore
//! use fos_audit::PluginDescriptor;
//! use serde_json::json;
//!
//! let plugin = PluginDescriptor::new("highlight")
//!     .command("add", |nodes| Ok(json!({ "added": nodes })))
//!     .on_cleanup(|| Ok(()));
//! engine.register_plugin(plugin)?;
//! engine.run_plugin_command("highlight", "add", json!(["#logo"]))?;
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Plugin command
pub type PluginCommand = Box<dyn Fn(Value) -> anyhow::Result<Value>>;

type Cleanup = Box<dyn FnMut() -> anyhow::Result<()>>;

/// Plugin errors
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Plugin {0} is already registered")]
    Duplicate(String),

    #[error("Plugin not found: {0}")]
    NotFound(String),

    #[error("Plugin {plugin} has no command {command}")]
    UnknownCommand { plugin: String, command: String },

    /// A command returned an error
    #[error("Plugin {plugin} command {command} failed: {message}")]
    Command {
        plugin: String,
        command: String,
        message: String,
    },

    #[error("Plugin {plugin} cleanup failed: {message}")]
    Cleanup { plugin: String, message: String },
}

/// What a plugin registers
pub struct PluginDescriptor {
    pub id: String,
    pub commands: HashMap<String, PluginCommand>,
    pub cleanup: Option<Cleanup>,
}

impl PluginDescriptor {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            commands: HashMap::new(),
            cleanup: None,
        }
    }

    pub fn command<F>(mut self, id: &str, command: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + 'static,
    {
        self.commands.insert(id.to_string(), Box::new(command));
        self
    }

    pub fn on_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.cleanup = Some(Box::new(cleanup));
        self
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut commands: Vec<&String> = self.commands.keys().collect();
        commands.sort();
        f.debug_struct("PluginDescriptor")
            .field("id", &self.id)
            .field("commands", &commands)
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// Registered plugins, in registration order
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginDescriptor>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: PluginDescriptor) -> Result<(), PluginError> {
        if self.get(&plugin.id).is_some() {
            return Err(PluginError::Duplicate(plugin.id));
        }
        tracing::debug!("Registered plugin {} with {} commands", plugin.id, plugin.commands.len());
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run one command of a plugin
    pub fn run(&self, plugin: &str, command: &str, input: Value) -> Result<Value, PluginError> {
        let descriptor = self.get(plugin).ok_or_else(|| PluginError::NotFound(plugin.to_string()))?;
        let handler = descriptor.commands.get(command).ok_or_else(|| PluginError::UnknownCommand {
            plugin: plugin.to_string(),
            command: command.to_string(),
        })?;
        handler(input).map_err(|e| PluginError::Command {
            plugin: plugin.to_string(),
            command: command.to_string(),
            message: e.to_string(),
        })
    }

    /// Run every cleanup hook and unregister all plugins. Every hook runs
    /// even when an earlier one fails; the failures are returned.
    pub fn cleanup_all(&mut self) -> Vec<PluginError> {
        let mut errors = Vec::new();
        for mut plugin in self.plugins.drain(..) {
            let Some(cleanup) = plugin.cleanup.as_mut() else {
                continue;
            };
            if let Err(e) = cleanup() {
                tracing::warn!("Cleanup of plugin {} failed: {}", plugin.id, e);
                errors.push(PluginError::Cleanup {
                    plugin: plugin.id.clone(),
                    message: e.to_string(),
                });
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn echo() -> PluginDescriptor {
        PluginDescriptor::new("echo")
            .command("say", |input| Ok(json!({ "said": input })))
            .command("fail", |_| Err(anyhow::anyhow!("nothing to say")))
    }

    #[test]
    fn test_register_and_run() {
        let mut plugins = PluginRegistry::new();
        plugins.register(echo()).unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins.run("echo", "say", json!("hi")).unwrap(), json!({ "said": "hi" }));
    }

    #[test]
    fn test_errors() {
        let mut plugins = PluginRegistry::new();
        plugins.register(echo()).unwrap();
        assert!(matches!(plugins.register(echo()), Err(PluginError::Duplicate(_))));
        assert!(matches!(plugins.run("nope", "say", Value::Null), Err(PluginError::NotFound(_))));
        assert!(matches!(
            plugins.run("echo", "shout", Value::Null),
            Err(PluginError::UnknownCommand { .. })
        ));
        assert!(matches!(
            plugins.run("echo", "fail", Value::Null),
            Err(PluginError::Command { .. })
        ));
    }

    #[test]
    fn test_cleanup_all() {
        let cleaned = Rc::new(Cell::new(0));
        let counter = cleaned.clone();
        let mut plugins = PluginRegistry::new();
        plugins
            .register(PluginDescriptor::new("a").on_cleanup(move || {
                counter.set(counter.get() + 1);
                Ok(())
            }))
            .unwrap();
        plugins
            .register(PluginDescriptor::new("b").on_cleanup(|| Err(anyhow::anyhow!("busy"))))
            .unwrap();

        let errors = plugins.cleanup_all();
        assert_eq!(cleaned.get(), 1);
        assert_eq!(errors.len(), 1);
        assert!(plugins.is_empty());
    }
}
