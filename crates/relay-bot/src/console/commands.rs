use relay_core::{CommandHandler, CommandRegistry};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Console commands, several handlers per name allowed
#[derive(Clone, Default)]
pub struct CommandTable {
    handlers: HashMap<String, Vec<CommandHandler>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure without wrapping it in an `Arc` first
    pub fn add<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(handler));
        self
    }

    /// Sorted command names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run one input line; returns every reply produced
    ///
    /// The first word is the command, the rest of the line (after one space)
    /// its argument.
    pub fn execute(&self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let (name, argument) = line.split_once(' ').unwrap_or((line, ""));
        let name = name.to_ascii_lowercase();

        let Some(handlers) = self.handlers.get(&name) else {
            return vec![format!("unknown command: {name}")];
        };

        tracing::debug!(command = %name, "Console command");
        handlers
            .iter()
            .filter_map(|handler| handler(argument))
            .collect()
    }
}

impl CommandRegistry for CommandTable {
    fn register(&mut self, name: &str, handler: CommandHandler) {
        self.handlers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(handler);
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.names())
            .finish()
    }
}
