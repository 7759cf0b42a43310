//! Discord gateway client
//!
//! - [`protocol`]: opcodes, the JSON envelope, payloads, close codes, intents
//! - [`events`]: dispatch events and the handler registry
//! - [`shard`]: the I/O-free protocol state machine
//! - [`client`]: the reconnecting websocket client
//! - [`http`]: endpoint discovery and channel messages

pub mod client;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod http;
pub mod protocol;
pub mod shard;
pub mod snowflake;

pub use client::{GatewayClient, SessionOutcome};
pub use error::{GatewayError, GatewayResult};
pub use events::{
    EventHandler, EventHandlers, GatewayEvent, GatewayEventType, MessageCreateEvent, ReadyEvent,
    User,
};
pub use heartbeat::HeartbeatTimer;
pub use http::{DiscordHttp, GatewayEndpoint, SessionStartLimit};
pub use protocol::{CloseCode, GatewayMessage, Intents, OpCode};
pub use shard::{Action, Shard};
pub use snowflake::{Snowflake, SnowflakeParseError};
