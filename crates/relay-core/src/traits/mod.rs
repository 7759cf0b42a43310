//! Boundary traits (ports) between the protocol adapters and the agent

mod console;
mod store;

pub use console::{CommandHandler, CommandRegistry};
pub use store::{MessageStore, StoreResult};
