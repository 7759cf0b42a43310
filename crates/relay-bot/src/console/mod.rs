//! Administrative line console
//!
//! A plain TCP listener: each connection gets a greeting and a prompt, and
//! every line is run as `command argument`.

mod builtins;
mod commands;
mod server;

pub use builtins::{register_builtins, Builtins};
pub use commands::CommandTable;
pub use server::ConsoleServer;

/// Greeting sent on connect
pub const GREETING: &str = "HENLO\n";
/// Prompt sent after every reply
pub const PROMPT: &str = ": ";
