//! # relay-irc
//!
//! Client for the IRC-style line protocol spoken by Twitch chat: message
//! grammar, outbound helpers, per-command dispatch, and the reconnecting
//! session controller.

pub mod client;
pub mod handlers;
pub mod message;
pub mod sender;

pub use client::{IrcClient, SessionEnd};
pub use handlers::{HandlerTable, MessageHandler};
pub use message::{IrcMessage, ParseError};
pub use sender::{IrcHandle, IrcSender};
