//! Dispatch events and the handler registry

mod event_types;
mod handlers;
mod payloads;

pub use event_types::GatewayEventType;
pub use handlers::{EventHandler, EventHandlers};
pub use payloads::{MessageCreateEvent, ReadyEvent, User};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// One op=0 frame after decoding
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayEvent {
    /// Wire name, kept even when the kind is unknown
    pub name: String,
    pub kind: Option<GatewayEventType>,
    pub sequence: u64,
    pub data: Value,
}

impl GatewayEvent {
    pub fn new(name: impl Into<String>, sequence: u64, data: Value) -> Self {
        let name = name.into();
        Self {
            kind: GatewayEventType::from_str(&name),
            name,
            sequence,
            data,
        }
    }

    /// Deserialize the payload into a typed view
    pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data)
    }

    pub fn is(&self, kind: GatewayEventType) -> bool {
        self.kind == Some(kind)
    }
}
