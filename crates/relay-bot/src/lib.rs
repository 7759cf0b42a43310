//! # relay-bot
//!
//! Bootstrap for the chat relay: wires the IRC and gateway clients to the
//! SQLite message log and the admin console.

pub mod app;
pub mod console;
pub mod store;

pub use app::{gateway_client, irc_client, run};
pub use store::{MessageLog, SqliteMessageStore};
