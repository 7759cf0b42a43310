//! Command console port

use std::sync::Arc;

/// Callback for one console command, given the text after the command name
///
/// Returns a line to show the operator, if any.
pub type CommandHandler = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub trait CommandRegistry {
    /// Register `handler` under `name`; several handlers may share a name
    fn register(&mut self, name: &str, handler: CommandHandler);
}
