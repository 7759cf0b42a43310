//! Typed views of the dispatch payloads the relay reads

use crate::snowflake::Snowflake;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// READY payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    /// Gateway protocol version
    pub v: u8,

    /// The bot user
    pub user: User,

    /// Session id for resuming
    pub session_id: String,

    /// Where to reconnect when resuming
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_gateway_url: Option<String>,
}

/// User object as embedded in events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,

    /// Legacy four-digit tag; "0" for migrated accounts
    #[serde(default = "default_discriminator")]
    pub discriminator: String,

    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub bot: bool,

    #[serde(default)]
    pub global_name: Option<String>,
}

fn default_discriminator() -> String {
    "0".to_string()
}

impl User {
    /// Name to show in logs: global name when set, else username
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

/// MESSAGE_CREATE payload, also the response body of a message POST
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreateEvent {
    pub id: Snowflake,
    pub channel_id: Snowflake,

    /// Absent for direct messages
    #[serde(default)]
    pub guild_id: Option<Snowflake>,

    pub author: User,

    /// Empty unless the MESSAGE_CONTENT intent is granted
    #[serde(default)]
    pub content: String,

    pub timestamp: DateTime<Utc>,
}
