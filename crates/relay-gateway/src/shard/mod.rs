//! Gateway protocol state machine
//!
//! [`Shard`] owns the per-connection protocol state (sequence, session id,
//! heartbeat accounting) and turns inbound frames into [`Action`]s. It does no
//! I/O, so every transition can be driven directly in tests; the client
//! executes the actions against the live socket.

mod machine;

pub use machine::Shard;

use crate::events::GatewayEvent;
use crate::protocol::GatewayMessage;
use std::time::Duration;

/// Side effect requested by the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Enqueue a frame on the session's write queue
    Send(GatewayMessage),
    /// (Re)arm the heartbeat timer with this period
    StartHeartbeat(Duration),
    /// Hand an event to the registered handlers
    Dispatch(GatewayEvent),
    /// Drop this connection and open a new one
    Reconnect { resume: bool },
    /// Heartbeats went unanswered; the connection is presumed dead
    Zombie { unacked: u32 },
}
