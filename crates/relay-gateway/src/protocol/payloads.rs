//! Payload definitions for the opcodes this client speaks

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Intents;

/// Payload for op 10 (Hello)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Payload for op 2 (Identify)
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub token: String,
    pub intents: Intents,
    pub properties: IdentifyProperties,
    #[serde(default)]
    pub compress: bool,
    #[serde(default)]
    pub presence: PresencePayload,
}

impl IdentifyPayload {
    #[must_use]
    pub fn new(token: impl Into<String>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            intents,
            properties: IdentifyProperties::default(),
            compress: false,
            presence: PresencePayload::default(),
        }
    }
}

impl fmt::Debug for IdentifyPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifyPayload")
            .field("token", &"********")
            .field("intents", &self.intents)
            .field("properties", &self.properties)
            .field("compress", &self.compress)
            .field("presence", &self.presence)
            .finish()
    }
}

/// Client connection properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: env!("CARGO_PKG_NAME").to_string(),
            device: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Initial presence sent with Identify
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresencePayload {
    #[serde(default)]
    pub activities: Vec<serde_json::Value>,
    pub status: String,
    pub since: Option<u64>,
    #[serde(default)]
    pub afk: bool,
}

impl Default for PresencePayload {
    fn default() -> Self {
        Self {
            activities: Vec::new(),
            status: "online".to_string(),
            since: None,
            afk: false,
        }
    }
}

/// Payload for op 6 (Resume)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePayload {
    pub token: String,
    pub session_id: String,
    /// Last sequence number received
    pub seq: u64,
}

impl fmt::Debug for ResumePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumePayload")
            .field("token", &"********")
            .field("session_id", &self.session_id)
            .field("seq", &self.seq)
            .finish()
    }
}
