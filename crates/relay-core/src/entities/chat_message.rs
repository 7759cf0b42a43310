//! Chat message entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat line observed on one of the relayed networks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// When the agent received the message
    pub timestamp: DateTime<Utc>,
    /// Sender's display nick
    pub nick: String,
    /// Channel (or channel id) the message was sent to
    pub channel: String,
    pub text: String,
}

impl ChatMessage {
    /// Create a message stamped with the current time
    pub fn new(nick: impl Into<String>, channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            nick: nick.into(),
            channel: channel.into(),
            text: text.into(),
        }
    }

    /// Seconds since the Unix epoch, as persisted
    pub fn unix_timestamp(&self) -> i64 {
        self.timestamp.timestamp()
    }
}
