//! Records handed from protocol adapters to the rest of the agent

mod chat_message;

pub use chat_message::ChatMessage;
