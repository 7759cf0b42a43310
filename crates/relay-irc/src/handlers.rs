//! Per-command dispatch table

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::message::IrcMessage;
use crate::sender::IrcSender;

/// Callback invoked for every inbound message with a matching command
pub type MessageHandler = Arc<dyn Fn(&IrcSender, &IrcMessage) + Send + Sync>;

/// Handlers keyed by command word
///
/// Several handlers may share a command; they run in registration order.
/// Command matching is case-insensitive.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Vec<MessageHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the keepalive `PING` handler already registered
    pub fn with_keepalive() -> Self {
        let mut table = Self::new();
        table.register("PING", |sender, message| {
            if let Err(e) = sender.pong(message.ping_token()) {
                tracing::warn!(error = %e, "Failed to answer PING");
            }
        });
        table
    }

    pub fn register<F>(&mut self, command: &str, handler: F)
    where
        F: Fn(&IrcSender, &IrcMessage) + Send + Sync + 'static,
    {
        self.handlers
            .entry(command.to_ascii_uppercase())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Run every handler for `message`; returns how many ran
    pub fn dispatch(&self, sender: &IrcSender, message: &IrcMessage) -> usize {
        let Some(handlers) = self.handlers.get(&message.command.to_ascii_uppercase()) else {
            tracing::trace!(command = %message.command, "No handler");
            return 0;
        };

        for handler in handlers {
            handler(sender, message);
        }
        handlers.len()
    }

    pub fn handler_count(&self, command: &str) -> usize {
        self.handlers
            .get(&command.to_ascii_uppercase())
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut commands: Vec<_> = self.handlers.keys().collect();
        commands.sort();
        f.debug_struct("HandlerTable")
            .field("commands", &commands)
            .finish()
    }
}
